use std::fmt;

/// One step of a field path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Explicit path into a structured snapshot: `a.b[0].c` (or `a.b.0.c`).
///
/// Normalization rules are simple and deterministic:
/// - bracket indices render as `[n]`
/// - a bare numeric dotted segment stays a key; it indexes only when it meets an array
/// - empty segments are rejected
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(input: &str) -> Result<Self, String> {
        let input = input.trim();
        if input.is_empty() {
            return Err("field path must not be empty".to_string());
        }

        let mut segments = Vec::new();
        for part in input.split('.') {
            let (key, mut rest) = match part.find('[') {
                Some(i) => (&part[..i], &part[i..]),
                None => (part, ""),
            };
            if key.is_empty() && (rest.is_empty() || !segments.is_empty()) {
                return Err(format!("empty segment in field path '{input}'"));
            }
            if !key.is_empty() {
                segments.push(Segment::Key(key.to_string()));
            }
            while !rest.is_empty() {
                let Some(close) = rest.find(']') else {
                    return Err(format!("unclosed '[' in field path '{input}'"));
                };
                let raw = &rest[1..close];
                let idx = raw
                    .parse::<usize>()
                    .map_err(|_| format!("invalid index '{raw}' in field path '{input}'"))?;
                segments.push(Segment::Index(idx));
                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(format!("unexpected '{rest}' in field path '{input}'"));
                }
            }
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Canonical rendering of the first `n` segments.
    pub fn prefix(&self, n: usize) -> String {
        render(&self.segments[..n.min(self.segments.len())])
    }
}

fn render(segments: &[Segment]) -> String {
    let mut out = String::new();
    for seg in segments {
        match seg {
            Segment::Key(k) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(k);
            }
            Segment::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
        }
    }
    out
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(&self.segments))
    }
}
