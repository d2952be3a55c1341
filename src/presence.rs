// Online player names from the console `list` reply.
// Reply shape: "There are 2 of a max of 20 players online: Alice, Bob" (with optional § colour codes).

/// Colour/format marker: `§` followed by one code character.
const FORMAT_SENTINEL: char = '\u{00A7}';

/// Remove every `§x` formatting pair.
pub fn strip_formatting(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == FORMAT_SENTINEL {
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

/// Extract online player names. Never fails: a reply without a colon (or with
/// nothing after it) yields an empty list. Order is the server's.
pub fn parse_online_players(raw: &str) -> Vec<String> {
    let clean = strip_formatting(raw);
    let Some((_, tail)) = clean.split_once(':') else {
        return Vec::new();
    };
    tail.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
