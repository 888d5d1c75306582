//! Word and phrase providers.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use super::{parse_options, FakeError, FakeKind, Options};
use crate::distribution::{parse_record_size, parse_size_range, Distribution};

const DEFAULT_SEPARATOR: &str = " ";

const WORDS: &[&str] = &[
    "alias", "consequatur", "aut", "perferendis", "sit", "voluptatem", "accusantium",
    "doloremque", "aperiam", "eaque", "ipsa", "quae", "ab", "illo", "inventore", "veritatis",
    "et", "quasi", "architecto", "beatae", "vitae", "dicta", "sunt", "explicabo", "aspernatur",
    "odit", "fugit", "sed", "quia", "consequuntur", "magni", "dolores", "eos", "qui",
    "ratione", "sequi", "nesciunt", "neque", "dolorem", "ipsum", "dolor", "amet",
    "consectetur", "adipisci", "velit", "non", "numquam", "eius", "modi", "tempora",
    "incidunt", "ut", "labore", "dolore", "magnam", "aliquam", "quaerat", "enim", "ad",
    "minima", "veniam", "quis", "nostrum", "exercitationem", "ullam", "corporis",
    "suscipit", "laboriosam", "nisi", "aliquid", "ex", "ea", "commodi", "autem", "vel",
    "eum", "iure", "reprehenderit", "in", "voluptate", "esse", "quam", "nihil", "molestiae",
    "illum", "fugiat", "quo", "voluptas", "nulla", "pariatur", "at", "vero", "accusamus",
    "officiis", "debitis", "rerum", "necessitatibus", "saepe", "eveniet", "repudiandae",
    "recusandae", "itaque", "earum", "hic", "tenetur", "sapiente", "delectus", "reiciendis",
    "maiores", "doloribus", "asperiores", "repellat",
];

const HACKER_ABBREVIATIONS: &[&str] = &[
    "TCP", "HTTP", "SDD", "RAM", "GB", "CSS", "SSL", "AGP", "SQL", "FTP", "PCI", "AI", "ADP",
    "RSS", "XML", "EXE", "COM", "HDD", "THX", "SMTP", "SMS", "USB", "PNG", "SAS", "IB",
    "SCSI", "JSON", "XSS", "JBOD",
];

const HACKER_ADJECTIVES: &[&str] = &[
    "auxiliary", "primary", "back-end", "digital", "open-source", "virtual", "cross-platform",
    "redundant", "online", "haptic", "multi-byte", "bluetooth", "wireless", "1080p",
    "neural", "optical", "solid state", "mobile",
];

const HACKER_NOUNS: &[&str] = &[
    "driver", "protocol", "bandwidth", "panel", "microchip", "program", "port", "card",
    "array", "interface", "system", "sensor", "firewall", "hard drive", "pixel", "alarm",
    "feed", "monitor", "application", "transmitter", "bus", "circuit", "capacitor", "matrix",
];

const HACKER_VERBS: &[&str] = &[
    "back up", "bypass", "hack", "override", "compress", "copy", "navigate", "index",
    "connect", "generate", "quantify", "calculate", "synthesize", "input", "transmit",
    "program", "reboot", "parse",
];

const HACKER_ING_VERBS: &[&str] = &[
    "backing up", "bypassing", "hacking", "overriding", "compressing", "copying",
    "navigating", "indexing", "connecting", "generating", "quantifying", "calculating",
    "synthesizing", "transmitting", "programming", "parsing",
];

/// Pick one random word.
pub fn word<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    pick(rng, WORDS)
}

/// Options for the `words` kind, as written in the configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct WordsOptions {
    pub count: Option<usize>,
    pub size: Option<String>,
    pub size_range: Option<String>,
    pub size_range_with_possibility: Option<Vec<String>>,
    pub fixed_words: Option<Vec<String>>,
    pub separator: Option<String>,
}

/// How a `words` value is sized.
#[derive(Debug, Clone)]
enum WordsMode {
    Count(usize),
    Size(i64),
    SizeRange(i64, i64),
    Distribution(Distribution),
    Fixed(Vec<String>),
}

/// Compiled `words` provider.
#[derive(Debug, Clone)]
pub struct WordsProvider {
    mode: WordsMode,
    separator: String,
}

impl WordsProvider {
    /// Decode and validate `words` options. Exactly one sizing option must be set.
    pub fn new(options: &Options) -> Result<Self, FakeError> {
        let kind = FakeKind::Words;
        let opts: WordsOptions = parse_options(kind, options)?;

        let mut modes = Vec::new();

        if let Some(count) = opts.count {
            if count == 0 {
                return Err(FakeError::invalid(kind, "count should be a positive integer"));
            }
            modes.push(WordsMode::Count(count));
        }

        if let Some(size) = &opts.size {
            let size = parse_record_size(size).map_err(|message| FakeError::invalid(kind, message))?;
            if size <= 0 {
                return Err(FakeError::invalid(kind, "size should be a positive integer"));
            }
            modes.push(WordsMode::Size(size));
        }

        if let Some(range) = &opts.size_range {
            let (min, max) =
                parse_size_range(range).map_err(|message| FakeError::invalid(kind, message))?;
            if min <= 0 || max <= 0 {
                return Err(FakeError::invalid(kind, "size range should be positive"));
            }
            if min >= max {
                return Err(FakeError::invalid(kind, "min should be less than max"));
            }
            modes.push(WordsMode::SizeRange(min, max));
        }

        if let Some(specs) = &opts.size_range_with_possibility {
            let distribution = Distribution::parse(specs.as_slice())
                .map_err(|source| FakeError::Distribution { kind, source })?;
            modes.push(WordsMode::Distribution(distribution));
        }

        if let Some(fixed) = &opts.fixed_words {
            if fixed.is_empty() {
                return Err(FakeError::invalid(kind, "fixedWords should not be empty"));
            }
            modes.push(WordsMode::Fixed(fixed.clone()));
        }

        if modes.len() > 1 {
            return Err(FakeError::invalid(
                kind,
                "only one of count, size, sizeRange, sizeRangeWithPossibility or fixedWords should be set",
            ));
        }

        let mode = modes.pop().ok_or_else(|| {
            FakeError::invalid(
                kind,
                "should set one of count, size, sizeRange, sizeRangeWithPossibility or fixedWords",
            )
        })?;

        Ok(Self {
            mode,
            separator: opts
                .separator
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SEPARATOR.to_string()),
        })
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        match &self.mode {
            WordsMode::Count(count) => {
                let words: Vec<&str> = (0..*count).map(|_| word(rng)).collect();
                words.join(&self.separator)
            }
            WordsMode::Size(size) => self.words_with_size(rng, *size),
            WordsMode::SizeRange(min, max) => {
                let size = rng.gen_range(*min..*max);
                self.words_with_size(rng, size)
            }
            WordsMode::Distribution(distribution) => {
                let size = distribution.sample(rng);
                self.words_with_size(rng, size)
            }
            WordsMode::Fixed(words) => words.choose(rng).cloned().unwrap_or_default(),
        }
    }

    /// Append random words until the joined length reaches `size` bytes.
    fn words_with_size<R: Rng + ?Sized>(&self, rng: &mut R, size: i64) -> String {
        let target = usize::try_from(size).unwrap_or(0);
        let mut out = String::with_capacity(target + 16);

        while out.len() < target {
            if !out.is_empty() {
                out.push_str(&self.separator);
            }
            out.push_str(word(rng));
        }

        out
    }
}

/// Generate a hacker-style phrase, e.g. "We need to back up the cross-platform PNG alarm!".
pub fn hacker_phrase<R: Rng + ?Sized>(rng: &mut R) -> String {
    let abbreviation = pick(rng, HACKER_ABBREVIATIONS);
    let adjective = pick(rng, HACKER_ADJECTIVES);
    let noun = pick(rng, HACKER_NOUNS);
    let verb = pick(rng, HACKER_VERBS);
    let ing_verb = pick(rng, HACKER_ING_VERBS);

    match rng.gen_range(0..6) {
        0 => format!(
            "If we {} the {}, we can get to the {} {} through the {} {} {}!",
            verb,
            noun,
            abbreviation,
            noun,
            adjective,
            abbreviation,
            pick(rng, HACKER_NOUNS)
        ),
        1 => format!("We need to {} the {} {} {}!", verb, adjective, abbreviation, noun),
        2 => format!(
            "Try to {} the {} {}, maybe it will {} the {} {}!",
            verb,
            abbreviation,
            noun,
            pick(rng, HACKER_VERBS),
            adjective,
            pick(rng, HACKER_NOUNS)
        ),
        3 => format!(
            "You can't {} the {} without {} the {} {} {}!",
            verb,
            noun,
            ing_verb,
            adjective,
            abbreviation,
            pick(rng, HACKER_NOUNS)
        ),
        4 => format!(
            "The {} {} is down, {} the {} {} so we can {} the {} {}!",
            abbreviation,
            noun,
            verb,
            adjective,
            pick(rng, HACKER_NOUNS),
            pick(rng, HACKER_VERBS),
            pick(rng, HACKER_ABBREVIATIONS),
            pick(rng, HACKER_NOUNS)
        ),
        _ => format!(
            "{} the {} won't do anything, we need to {} the {} {} {}!",
            capitalize(ing_verb),
            noun,
            verb,
            adjective,
            abbreviation,
            pick(rng, HACKER_NOUNS)
        ),
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, list: &[&'static str]) -> &'static str {
    list[rng.gen_range(0..list.len())]
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
