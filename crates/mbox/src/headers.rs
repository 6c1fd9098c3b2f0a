/// Ordered header fields of one message (or one MIME part).
///
/// Folded continuation lines are unfolded into a single space. Lookups are
/// case-insensitive and return the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    fields: Vec<(String, String)>,
}

impl HeaderMap {
    /// Parse a header section from the start of `text`.
    ///
    /// Returns the headers and the byte offset where the body begins. Header
    /// parsing stops at the first blank line, or at the first line that is
    /// neither a field nor a continuation.
    pub fn parse(text: &str) -> (Self, usize) {
        let mut fields: Vec<(String, String)> = Vec::new();
        let mut offset = 0usize;

        for line in text.split_inclusive('\n') {
            let content = line.trim_end_matches(['\r', '\n']);
            if content.is_empty() {
                offset += line.len();
                break;
            }

            if content.starts_with([' ', '\t']) {
                if let Some((_, value)) = fields.last_mut() {
                    let folded = content.trim();
                    if !folded.is_empty() {
                        if !value.is_empty() {
                            value.push(' ');
                        }
                        value.push_str(folded);
                    }
                    offset += line.len();
                    continue;
                }
                break;
            }

            match split_field(content) {
                Some((name, value)) => {
                    fields.push((name.to_string(), value.trim().to_string()));
                    offset += line.len();
                }
                None => break,
            }
        }

        (Self { fields }, offset)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Like [`get`](Self::get) but blank values count as missing.
    pub fn get_nonempty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|value| !value.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Media type of a Content-Type header, lower-cased, parameters dropped.
    pub fn content_type(&self) -> Option<String> {
        self.get("Content-Type").map(|value| {
            value
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }

    /// A parameter of the Content-Type header (e.g. `boundary`).
    pub fn content_type_param(&self, param: &str) -> Option<String> {
        let value = self.get("Content-Type")?;
        value.split(';').skip(1).find_map(|part| {
            let (key, val) = part.split_once('=')?;
            if key.trim().eq_ignore_ascii_case(param) {
                Some(val.trim().trim_matches('"').to_string())
            } else {
                None
            }
        })
    }
}

fn split_field(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    let valid_name = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_graphic() && b != b':');
    valid_name.then_some((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_and_unfolds() {
        let text = "From: Bob <bob@example.com>\r\nSubject: a long\r\n\tsubject line\r\nmessage-id: <1@x>\r\n\r\nbody\r\n";
        let (headers, offset) = HeaderMap::parse(text);
        assert_eq!(headers.len(), 3);
        assert_eq!(headers.get("subject"), Some("a long subject line"));
        assert_eq!(headers.get("Message-ID"), Some("<1@x>"));
        assert_eq!(&text[offset..], "body\r\n");
    }

    #[test]
    fn first_occurrence_wins() {
        let (headers, _) = HeaderMap::parse("Received: a\nReceived: b\n\n");
        assert_eq!(headers.get("received"), Some("a"));
    }

    #[test]
    fn stops_at_non_header_line() {
        let text = "From: a@b.c\nthis is not a header\nmore\n";
        let (headers, offset) = HeaderMap::parse(text);
        assert_eq!(headers.len(), 1);
        assert_eq!(&text[offset..], "this is not a header\nmore\n");
    }

    #[test]
    fn no_headers_at_all() {
        let (headers, offset) = HeaderMap::parse("just some text\n");
        assert!(headers.is_empty());
        assert_eq!(offset, 0);
    }

    #[test]
    fn content_type_parameters() {
        let (headers, _) = HeaderMap::parse(
            "Content-Type: Multipart/Mixed; charset=us-ascii; boundary=\"=-=abc\"\n\n",
        );
        assert_eq!(headers.content_type().as_deref(), Some("multipart/mixed"));
        assert_eq!(
            headers.content_type_param("BOUNDARY").as_deref(),
            Some("=-=abc")
        );
        assert_eq!(headers.content_type_param("name"), None);
    }

    #[test]
    fn blank_values_are_missing_for_get_nonempty() {
        let (headers, _) = HeaderMap::parse("In-Reply-To:   \nSubject: x\n\n");
        assert_eq!(headers.get("In-Reply-To"), Some(""));
        assert_eq!(headers.get_nonempty("In-Reply-To"), None);
    }
}
