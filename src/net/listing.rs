// Directory-listing HTML helpers.
// Naive by intent: archive index pages are flat lists of anchors, so a
// case-insensitive scan for `<a ... href=...>` is enough.

/// Every anchor `href` in `html`, in document order, entities decoded.
pub fn anchor_hrefs(html: &str) -> Vec<String> {
    // ASCII-only lowercasing keeps byte offsets aligned with `html`.
    let lc = to_lowercase_fast(html);
    let mut out = Vec::new();
    let mut from = 0;

    while let Some(rel) = lc[from..].find("<a") {
        let after = from + rel + 2;
        let Some(end_rel) = lc[after..].find('>') else {
            break;
        };
        let end = after + end_rel;

        // Skip `<abbr>`, `<address>` and friends.
        let is_anchor = lc[after..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_whitespace() || c == '>');
        if is_anchor {
            if let Some(href) = attr_value(&html[after..end], &lc[after..end], "href") {
                out.push(decode_entities(href));
            }
        }
        from = end + 1;
    }
    out
}

/// Value of attribute `name` inside the body of an opening tag.
/// Quoted and bare values are both accepted.
fn attr_value<'a>(tag: &'a str, tag_lc: &str, name: &str) -> Option<&'a str> {
    let mut from = 0;
    while let Some(rel) = tag_lc[from..].find(name) {
        let pos = from + rel;
        from = pos + name.len();

        let starts_word = tag_lc[..pos]
            .chars()
            .next_back()
            .map_or(true, |c| c.is_ascii_whitespace());
        let rest = tag_lc[from..].trim_start();
        if !starts_word || !rest.starts_with('=') {
            continue;
        }

        // Offset just past '=' and any whitespace after it.
        let eq = tag_lc.len() - rest.len() + 1;
        let value = tag[eq..].trim_start();

        return match value.chars().next() {
            Some(q @ ('"' | '\'')) => {
                let inner = &value[1..];
                inner.find(q).map(|close| &inner[..close])
            }
            Some(_) => {
                let stop = value
                    .find(|c: char| c.is_ascii_whitespace())
                    .unwrap_or(value.len());
                Some(&value[..stop])
            }
            None => None,
        };
    }
    None
}

/// Decode the entities that show up in listing URLs.
pub fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Fast ASCII-only lowercasing for tag/attribute matching.
pub fn to_lowercase_fast(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}
