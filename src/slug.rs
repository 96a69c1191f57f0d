use once_cell::sync::Lazy;
use regex::Regex;

// ── Transliteration table ────────────────────────────────────────────────────

/// Accented and punctuation characters folded to ASCII before stripping.
const TRANSLITERATIONS: &[(char, char)] = &[
    ('à', 'a'), ('á', 'a'), ('ä', 'a'), ('â', 'a'), ('ã', 'a'), ('å', 'a'), ('ă', 'a'), ('æ', 'a'), ('ą', 'a'),
    ('ç', 'c'), ('ć', 'c'), ('č', 'c'),
    ('đ', 'd'), ('ď', 'd'),
    ('è', 'e'), ('é', 'e'), ('ě', 'e'), ('ė', 'e'), ('ë', 'e'), ('ê', 'e'), ('ę', 'e'),
    ('ğ', 'g'), ('ǵ', 'g'),
    ('ḧ', 'h'),
    ('ì', 'i'), ('í', 'i'), ('ï', 'i'), ('î', 'i'), ('į', 'i'),
    ('ł', 'l'),
    ('ḿ', 'm'),
    ('ǹ', 'n'), ('ń', 'n'), ('ň', 'n'), ('ñ', 'n'),
    ('ò', 'o'), ('ó', 'o'), ('ö', 'o'), ('ô', 'o'), ('œ', 'o'), ('ø', 'o'),
    ('ṕ', 'p'),
    ('ŕ', 'r'), ('ř', 'r'),
    ('ß', 's'), ('ş', 's'), ('ś', 's'), ('š', 's'), ('ș', 's'),
    ('ť', 't'), ('ț', 't'),
    ('ù', 'u'), ('ú', 'u'), ('ü', 'u'), ('û', 'u'), ('ǘ', 'u'), ('ů', 'u'), ('ű', 'u'), ('ū', 'u'), ('ų', 'u'),
    ('ẃ', 'w'),
    ('ẍ', 'x'),
    ('ÿ', 'y'), ('ý', 'y'),
    ('ź', 'z'), ('ž', 'z'), ('ż', 'z'),
    ('·', '-'), ('/', '-'), ('_', '-'), (',', '-'), (':', '-'), (';', '-'),
];

// ── Lazy static regexes ──────────────────────────────────────────────────────

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// ASCII word characters only; anything non-ASCII that survived the table is dropped.
static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\-]+").unwrap());

static MULTI_HYPHEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").unwrap());

// ── Public API ───────────────────────────────────────────────────────────────

/// Turn free text into a lowercase, hyphen-delimited, URL-safe token.
///
/// Total and deterministic: every input yields a slug, possibly empty.
pub fn slugify(input: &str) -> String {
    let lower = input.to_lowercase();
    let hyphenated = WHITESPACE_RE.replace_all(&lower, "-");
    let folded: String = hyphenated.chars().map(transliterate).collect();
    let anded = folded.replace('&', "-and-");
    let stripped = NON_WORD_RE.replace_all(&anded, "");
    let collapsed = MULTI_HYPHEN_RE.replace_all(&stripped, "-");
    collapsed.trim_matches('-').to_string()
}

fn transliterate(c: char) -> char {
    TRANSLITERATIONS
        .iter()
        .find(|(from, _)| *from == c)
        .map(|(_, to)| *to)
        .unwrap_or(c)
}
