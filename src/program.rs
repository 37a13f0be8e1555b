use crate::{ErrorKind, Instruction, Opcode, QuadError};

/// A loaded Quad program: the instruction vector up to and including the
/// first `HALT`. Instruction indices are 1-based.
#[derive(Clone, PartialEq, Debug)]
pub struct Program {
    pub code: Vec<Instruction>,
}

/// Removes `/* ... */` (possibly spanning lines, tracked by `in_comment`)
/// and `#`-to-end-of-line comments from a single line.
fn strip_comments(line: &str, in_comment: &mut bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while !rest.is_empty() {
        if *in_comment {
            match rest.find("*/") {
                Some(pos) => {
                    *in_comment = false;
                    rest = &rest[pos + 2..];
                }
                None => break,
            }
        } else {
            match (rest.find('#'), rest.find("/*")) {
                (Some(hash), Some(open)) if hash < open => {
                    out.push_str(&rest[..hash]);
                    break;
                }
                (_, Some(open)) => {
                    out.push_str(&rest[..open]);
                    *in_comment = true;
                    rest = &rest[open + 2..];
                }
                (Some(hash), None) => {
                    out.push_str(&rest[..hash]);
                    break;
                }
                (None, None) => {
                    out.push_str(rest);
                    break;
                }
            }
        }
    }

    out
}

/// Drops a tolerated leading `N:` index token, as produced by the
/// compiler's numbered listing.
fn strip_index_prefix(line: &str) -> &str {
    let mut tokens = line.splitn(2, char::is_whitespace);
    if let Some(first) = tokens.next() {
        if first.ends_with(':') && first.len() > 1 && is_digits(&first[..first.len() - 1]) {
            return tokens.next().unwrap_or("");
        }
    }
    line
}

fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

impl Program {
    /// Parses Quad source text. Fails on malformed opcodes or operands, and
    /// with `MissingHalt` if the end of input is reached before a `HALT`.
    pub fn load(src: &str) -> Result<Program, QuadError> {
        let mut code = Vec::new();
        let mut in_comment = false;
        let mut lineno = 0u32;

        for (index, raw_line) in src.lines().enumerate() {
            lineno = index as u32 + 1;

            let line = strip_comments(raw_line, &mut in_comment);
            let line = strip_index_prefix(line.trim()).trim();
            if line.is_empty() {
                continue;
            }

            let instruction = Instruction::parse(line, lineno)?;
            let halted = instruction.op == Opcode::HALT;
            code.push(instruction);

            if halted {
                return Ok(Program { code });
            }
        }

        Err(QuadError::new(lineno, ErrorKind::MissingHalt))
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}
