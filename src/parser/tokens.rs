//! Streaming HTML tokenizer.
//!
//! Single pass over the raw document, no DOM. Emits start tags, end tags
//! and text runs in document order and never fails: malformed markup is
//! skipped or folded into text so one bad tag can't take down the page.

/// One structural event from the markup stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `<name key="value" ...>` — name and attribute keys lowercased,
    /// attributes in source order.
    StartTag {
        name: String,
        attrs: Vec<(String, String)>,
    },
    /// `</name>` — name lowercased.
    EndTag { name: String },
    /// A run of character data, entities decoded.
    Text(String),
}

/// Lazy tokenizer over a document. Create with [`tokenize`].
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    /// Set after `<script>`/`<style>`: swallow everything as raw text
    /// until the matching close tag.
    raw_until: Option<&'static str>,
}

/// Tokenize a document into a lazy stream of [`Token`]s.
pub fn tokenize(input: &str) -> Tokenizer<'_> {
    Tokenizer {
        input,
        pos: 0,
        raw_until: None,
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if self.pos >= self.input.len() {
                return None;
            }

            if let Some(close) = self.raw_until {
                return self.next_raw(close);
            }

            let rest = &self.input[self.pos..];
            if !rest.starts_with('<') {
                return Some(self.next_text());
            }

            match rest.as_bytes().get(1) {
                Some(b'!') if rest.starts_with("<!--") => self.skip_comment(),
                Some(b'!') | Some(b'?') => self.skip_declaration(),
                Some(b'/') => {
                    if let Some(token) = self.next_end_tag() {
                        return Some(token);
                    }
                }
                Some(c) if c.is_ascii_alphabetic() => {
                    if let Some(token) = self.next_start_tag() {
                        return Some(token);
                    }
                }
                // Stray `<` that opens nothing: plain text.
                _ => return Some(self.next_text()),
            }
        }
    }
}

impl<'a> Tokenizer<'a> {
    /// Inside `<script>`/`<style>`: everything up to the close tag is one
    /// raw text run, entities untouched.
    fn next_raw(&mut self, close: &'static str) -> Option<Token> {
        let rest = &self.input[self.pos..];
        let end = find_ci(rest, close).unwrap_or(rest.len());
        let content = &rest[..end];
        self.pos += end;
        self.raw_until = None;
        if content.is_empty() {
            self.next()
        } else {
            Some(Token::Text(content.to_string()))
        }
    }

    /// Text run up to the next `<` that could plausibly open a tag.
    fn next_text(&mut self) -> Token {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        // Consume at least one byte so a leading stray `<` makes progress.
        let mut i = self.pos + 1;
        while i < bytes.len() {
            if bytes[i] == b'<' {
                match bytes.get(i + 1) {
                    Some(c) if c.is_ascii_alphabetic() => break,
                    Some(b'/') | Some(b'!') | Some(b'?') => break,
                    _ => {}
                }
            }
            i += 1;
        }
        self.pos = i;
        Token::Text(decode_entities(&self.input[start..i]))
    }

    fn skip_comment(&mut self) {
        let rest = &self.input[self.pos + 4..];
        match rest.find("-->") {
            Some(i) => self.pos += 4 + i + 3,
            None => self.pos = self.input.len(),
        }
    }

    /// `<!doctype ...>`, `<![CDATA[...]]>`, `<?xml ...?>` — all skipped.
    fn skip_declaration(&mut self) {
        let rest = &self.input[self.pos..];
        match rest.find('>') {
            Some(i) => self.pos += i + 1,
            None => self.pos = self.input.len(),
        }
    }

    /// `</name ...>`. Junk between the name and `>` is ignored. An
    /// unterminated end tag at EOF is dropped.
    fn next_end_tag(&mut self) -> Option<Token> {
        let rest = &self.input[self.pos..];
        let body = &rest[2..];
        let name_len = body
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric())
            .count();
        let name = body[..name_len].to_ascii_lowercase();
        match rest.find('>') {
            Some(i) => self.pos += i + 1,
            None => {
                self.pos = self.input.len();
                return None;
            }
        }
        if name.is_empty() {
            None
        } else {
            Some(Token::EndTag { name })
        }
    }

    /// `<name attr=value ...>`. An unterminated start tag at EOF is
    /// dropped.
    fn next_start_tag(&mut self) -> Option<Token> {
        let bytes = self.input.as_bytes();
        let mut i = self.pos + 1;

        let name_start = i;
        while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-') {
            i += 1;
        }
        let name = self.input[name_start..i].to_ascii_lowercase();

        let mut attrs: Vec<(String, String)> = Vec::new();
        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() {
                // Tag never closed; drop it.
                self.pos = self.input.len();
                return None;
            }
            match bytes[i] {
                b'>' => {
                    i += 1;
                    break;
                }
                b'/' => {
                    i += 1;
                }
                _ => {
                    let (attr, next) = self.parse_attr(i);
                    if let Some(kv) = attr {
                        attrs.push(kv);
                    }
                    // Always make progress, even on junk bytes.
                    i = next.max(i + 1);
                }
            }
        }

        self.pos = i;
        self.raw_until = match name.as_str() {
            "script" => Some("</script"),
            "style" => Some("</style"),
            _ => None,
        };
        Some(Token::StartTag { name, attrs })
    }

    /// One `key`, `key=value`, `key="value"` or `key='value'` pair
    /// starting at byte `i`. Returns the pair (if a key was present) and
    /// the position after it.
    fn parse_attr(&self, mut i: usize) -> (Option<(String, String)>, usize) {
        let bytes = self.input.as_bytes();

        let key_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        let key = self.input[key_start..i].to_ascii_lowercase();
        if key.is_empty() {
            return (None, i);
        }

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            // Valueless attribute (`<option selected>`).
            return (Some((key, String::new())), i);
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
            let quote = bytes[i];
            i += 1;
            let val_start = i;
            while i < bytes.len() && bytes[i] != quote {
                i += 1;
            }
            let value = decode_entities(&self.input[val_start..i]);
            if i < bytes.len() {
                i += 1; // closing quote
            }
            (Some((key, value)), i)
        } else {
            let val_start = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                i += 1;
            }
            let value = decode_entities(&self.input[val_start..i]);
            (Some((key, value)), i)
        }
    }
}

/// Case-insensitive substring search, returns byte offset.
fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| {
        h[i..i + n.len()]
            .iter()
            .zip(n)
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
    })
}

/// Decode the character references that actually occur on the target
/// pages: the common named set plus numeric forms. Anything unknown is
/// left verbatim.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match parse_entity(rest) {
            Some((decoded, len)) => {
                out.push_str(&decoded);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parse one reference at the head of `text` (which starts with `&`).
/// Returns the decoded string and the number of bytes consumed.
fn parse_entity(text: &str) -> Option<(String, usize)> {
    let semi = text[1..].find(';').filter(|&i| i <= 31)? + 1;
    let body = &text[1..semi];

    let decoded = match body {
        "amp" => "&".to_string(),
        "lt" => "<".to_string(),
        "gt" => ">".to_string(),
        "quot" => "\"".to_string(),
        "apos" => "'".to_string(),
        "nbsp" => "\u{a0}".to_string(),
        _ => {
            let code = if let Some(hex) = body.strip_prefix("#x").or(body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok()?
            } else {
                return None;
            };
            char::from_u32(code)?.to_string()
        }
    };
    Some((decoded, semi + 1))
}

// ── Tests ──
