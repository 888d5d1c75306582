//! HTTP request values: URIs, versions, methods, status codes, user agents.

use rand::Rng;
use serde::Deserialize;

use super::identity;

const METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

const VERSIONS: &[&str] = &["HTTP/1.0", "HTTP/1.1", "HTTP/2.0"];

const STATUS_CODES: &[u16] = &[
    200, 201, 202, 204, 301, 302, 304, 400, 401, 403, 404, 405, 409, 429, 500, 502, 503, 504,
];

const BS_VERBS: &[&str] = &[
    "aggregate", "architect", "benchmark", "brand", "cultivate", "deliver", "deploy", "disintermediate",
    "drive", "embrace", "empower", "enable", "engage", "engineer", "enhance", "evolve", "expedite",
    "exploit", "extend", "facilitate", "generate", "grow", "harness", "implement", "incentivize",
    "incubate", "innovate", "integrate", "iterate", "leverage", "matrix", "maximize", "mesh",
    "monetize", "morph", "optimize", "orchestrate", "productize", "recontextualize", "reintermediate",
    "reinvent", "repurpose", "revolutionize", "scale", "seize", "strategize", "streamline",
    "syndicate", "synergize", "synthesize", "target", "transform", "transition", "unleash",
    "utilize", "visualize", "whiteboard",
];

const BS_ADJECTIVES: &[&str] = &[
    "24/7", "b2b", "b2c", "back-end", "best-of-breed", "bleeding-edge", "bricks-and-clicks",
    "clicks-and-mortar", "collaborative", "compelling", "cross-platform", "cross-media",
    "customized", "cutting-edge", "distributed", "dot-com", "dynamic", "e-business", "efficient",
    "end-to-end", "enterprise", "extensible", "frictionless", "front-end", "global",
    "granular", "holistic", "impactful", "innovative", "integrated", "interactive", "intuitive",
    "killer", "leading-edge", "magnetic", "mission-critical", "next-generation", "one-to-one",
    "open-source", "out-of-the-box", "plug-and-play", "proactive", "real-time", "revolutionary",
    "rich", "robust", "scalable", "seamless", "sexy", "sticky", "strategic", "synergistic",
    "transparent", "turn-key", "ubiquitous", "user-centric", "value-added", "vertical", "viral",
    "virtual", "visionary", "web-enabled", "wireless", "world-class",
];

const BS_NOUNS: &[&str] = &[
    "action-items", "applications", "architectures", "bandwidth", "channels", "communities",
    "content", "convergence", "deliverables", "e-business", "e-commerce", "e-markets",
    "e-services", "e-tailers", "experiences", "eyeballs", "functionalities", "infomediaries",
    "infrastructures", "initiatives", "interfaces", "markets", "methodologies", "metrics",
    "mindshare", "models", "networks", "niches", "paradigms", "partnerships", "platforms",
    "portals", "relationships", "roi", "schemas", "solutions", "supply-chains", "synergies",
    "systems", "technologies", "users", "vortals", "web-readiness", "web services",
];

const BROWSERS: &[&str] = &["chrome", "firefox", "safari", "opera"];

const PLATFORMS: &[&str] = &[
    "Windows NT 10.0; Win64; x64",
    "Windows NT 6.1; WOW64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "X11; Linux x86_64",
    "X11; Ubuntu; Linux i686",
    "iPhone; CPU iPhone OS 16_4 like Mac OS X",
    "Linux; Android 13; Pixel 7",
];

/// Options for the `uri` kind.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UriOptions {
    /// Generate an absolute URL instead of a bare path
    pub url: bool,
}

fn pick<R: Rng + ?Sized, T: Copy>(rng: &mut R, list: &[T]) -> T {
    list[rng.gen_range(0..list.len())]
}

/// A URI: an absolute URL when `url` is set, otherwise a path of 1-4
/// lower-cased, query-escaped segments.
pub fn uri<R: Rng + ?Sized>(rng: &mut R, options: &UriOptions) -> String {
    let segments = rng.gen_range(1..=4);
    let mut path = String::new();
    for _ in 0..segments {
        path.push('/');
        path.push_str(&escape_segment(&bs(rng)));
    }
    let path = path.to_lowercase();

    if options.url {
        identity::url(rng, &path)
    } else {
        path
    }
}

fn bs<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{} {} {}",
        pick(rng, BS_VERBS),
        pick(rng, BS_ADJECTIVES),
        pick(rng, BS_NOUNS)
    )
}

/// Query-style escaping: spaces become `+`, anything outside the unreserved
/// set is percent-encoded.
fn escape_segment(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

pub fn version<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    pick(rng, VERSIONS)
}

pub fn method<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    pick(rng, METHODS)
}

pub fn status_code<R: Rng + ?Sized>(rng: &mut R) -> u16 {
    pick(rng, STATUS_CODES)
}

/// A browser user agent string.
pub fn user_agent<R: Rng + ?Sized>(rng: &mut R) -> String {
    let platform = pick(rng, PLATFORMS);

    match pick(rng, BROWSERS) {
        "chrome" => format!(
            "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{}.0.{}.{} Safari/537.36",
            platform,
            rng.gen_range(90..=120),
            rng.gen_range(4000..=6000),
            rng.gen_range(0..=200)
        ),
        "firefox" => {
            let release = rng.gen_range(90..=120);
            format!(
                "Mozilla/5.0 ({}; rv:{}.0) Gecko/20100101 Firefox/{}.0",
                platform, release, release
            )
        }
        "safari" => format!(
            "Mozilla/5.0 ({}) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/{}.{} Safari/605.1.15",
            platform,
            rng.gen_range(13..=17),
            rng.gen_range(0..=6)
        ),
        _ => format!(
            "Opera/9.80 ({}) Presto/2.12.{} Version/{}.00",
            platform,
            rng.gen_range(300..=400),
            rng.gen_range(10..=12)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_uri_path_segments() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let path = uri(&mut rng, &UriOptions::default());
            assert!(path.starts_with('/'));

            let segments = path.split('/').skip(1).count();
            assert!((1..=4).contains(&segments), "{}", path);
            assert!(!path.contains(' '));
            assert_eq!(path, path.to_lowercase());
        }
    }

    #[test]
    fn test_uri_as_url() {
        let url = uri(&mut StdRng::seed_from_u64(5), &UriOptions { url: true });
        assert!(url.starts_with("http://www.") || url.starts_with("https://www."));
    }

    #[test]
    fn test_escape_segment() {
        assert_eq!(escape_segment("web services 24/7"), "web+services+24%2F7");
    }

    #[test]
    fn test_catalogue_values() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            assert!(VERSIONS.contains(&version(&mut rng)));
            assert!(METHODS.contains(&method(&mut rng)));
            assert!((100..600).contains(&status_code(&mut rng)));
            assert!(user_agent(&mut rng).contains('('));
        }
    }
}
