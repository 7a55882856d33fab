use sha2::{Digest, Sha256};

/// The fields a caller combines into a stable cache key. Two callers
/// producing the same logical request must produce the same key;
/// whitespace-only prompt differences are deliberately *not* normalized away
/// here (§4.1) — callers that want that must normalize before constructing
/// this.
#[derive(Debug, Clone)]
pub struct CacheKeyInput<'a> {
    pub model: &'a str,
    pub temperature_class: &'a str,
    pub prompt: &'a str,
    pub required_capability: &'a str,
    pub scope: &'a str,
}

impl CacheKeyInput<'_> {
    /// Stable hex-encoded SHA-256 fingerprint over the five fields, joined
    /// by a separator byte that cannot appear inside any field value on its
    /// own (a NUL), so field boundaries can't be confused by concatenation.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for field in [
            self.model,
            self.temperature_class,
            self.prompt,
            self.required_capability,
            self.scope,
        ] {
            hasher.update(field.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_fields_yield_identical_keys() {
        let a = CacheKeyInput {
            model: "planner-v1",
            temperature_class: "low",
            prompt: "build a ping endpoint",
            required_capability: "plan",
            scope: "task:123",
        };
        let b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn differing_prompt_yields_differing_key() {
        let a = CacheKeyInput {
            model: "planner-v1",
            temperature_class: "low",
            prompt: "build a ping endpoint",
            required_capability: "plan",
            scope: "task:123",
        };
        let mut b = a.clone();
        b.prompt = "build a pong endpoint";
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn field_boundary_cannot_be_confused_by_concatenation() {
        let a = CacheKeyInput {
            model: "ab",
            temperature_class: "c",
            prompt: "",
            required_capability: "",
            scope: "",
        };
        let b = CacheKeyInput {
            model: "a",
            temperature_class: "bc",
            prompt: "",
            required_capability: "",
            scope: "",
        };
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
