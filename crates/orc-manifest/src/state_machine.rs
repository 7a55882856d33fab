use std::fmt;

/// A raw `FILE: <path>` block before path validation.
pub(crate) struct RawBlock {
    pub path: String,
    pub content: String,
}

#[derive(Debug)]
pub(crate) struct ScanError(String);

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ScanError {}

enum State {
    Scanning,
    InFileBlock { path: String, body: Vec<String> },
}

const FILE_PREFIX: &str = "FILE: ";

/// Scans `input` line by line with an explicit two-state machine, per the
/// design notes' "small explicit state machine ... no regex-driven prose
/// parsing" guidance.
pub(crate) fn scan(input: &str, strict: bool) -> Result<Vec<RawBlock>, ScanError> {
    let mut state = State::Scanning;
    let mut blocks = Vec::new();

    for line in input.split('\n') {
        let is_file_header = line.starts_with(FILE_PREFIX) && !line[FILE_PREFIX.len()..].is_empty();

        match (&mut state, is_file_header) {
            (State::Scanning, true) => {
                let path = line[FILE_PREFIX.len()..].to_string();
                state = State::InFileBlock {
                    path,
                    body: Vec::new(),
                };
            }
            (State::Scanning, false) => {
                if strict && !line.trim().is_empty() {
                    return Err(ScanError(format!(
                        "unexpected text outside a FILE block: {line:?}"
                    )));
                }
                // Non-strict: discard prose.
            }
            (State::InFileBlock { path, body }, true) => {
                blocks.push(RawBlock {
                    path: std::mem::take(path),
                    content: body.join("\n"),
                });
                let new_path = line[FILE_PREFIX.len()..].to_string();
                state = State::InFileBlock {
                    path: new_path,
                    body: Vec::new(),
                };
            }
            (State::InFileBlock { body, .. }, false) => {
                body.push(line.to_string());
            }
        }
    }

    if let State::InFileBlock { path, body } = state {
        blocks.push(RawBlock {
            path,
            content: body.join("\n"),
        });
    }

    Ok(blocks)
}
