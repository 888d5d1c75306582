//! Host and user identity values: IPv4 addresses, domain names, usernames, UUIDs.

use rand::Rng;

const LAST_NAMES: &[&str] = &[
    "Abbott", "Bechtelar", "Collins", "Daugherty", "Ernser", "Feeney", "Gislason", "Hoppe",
    "Jacobson", "Kautzer", "Lockman", "Mraz", "Nolan", "Okuneva", "Pollich", "Quigley",
    "Runolfsdottir", "Schinner", "Turcotte", "Upton", "Volkman", "Wisoky", "Yundt", "Zieme",
];

const DOMAIN_WORDS: &[&str] = &[
    "chief", "corporate", "dynamic", "forward", "global", "human", "internal", "investor",
    "legacy", "national", "principal", "regional", "senior", "central", "direct", "district",
];

const DOMAIN_VERBS: &[&str] = &[
    "monetize", "reinvent", "leverage", "deploy", "integrate", "orchestrate", "syndicate",
    "transition", "visualize", "whiteboard", "e-enable", "benchmark", "scale", "harness",
];

const DOMAIN_SUFFIXES: &[&str] = &["com", "net", "org", "io", "biz", "info", "name"];

fn pick<R: Rng + ?Sized>(rng: &mut R, list: &[&'static str]) -> &'static str {
    list[rng.gen_range(0..list.len())]
}

/// A random dotted-quad IPv4 address.
pub fn ipv4<R: Rng + ?Sized>(rng: &mut R) -> String {
    let octets: [u8; 4] = rng.gen();
    std::net::Ipv4Addr::from(octets).to_string()
}

/// A username in the `Lastname1234` shape.
pub fn username<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{}{}", pick(rng, LAST_NAMES), rng.gen_range(0..10_000))
}

/// A numeric user id between 1000 and 99999999.
pub fn user_id<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    rng.gen_range(1_000..=99_999_999)
}

/// A random (v4) UUID drawn from the injected random source.
pub fn uuid<R: Rng + ?Sized>(rng: &mut R) -> String {
    let bytes: [u8; 16] = rng.gen();
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .to_string()
}

/// A domain name such as `chiefmonetize.org`.
pub fn domain_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{}{}.{}",
        pick(rng, DOMAIN_WORDS),
        pick(rng, DOMAIN_VERBS),
        pick(rng, DOMAIN_SUFFIXES)
    )
}

/// A full URL on a random domain, used by the `uri` kind.
pub fn url<R: Rng + ?Sized>(rng: &mut R, path: &str) -> String {
    let scheme = if rng.gen_bool(0.5) { "https" } else { "http" };
    format!("{}://www.{}{}", scheme, domain_name(rng), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    #[test]
    fn test_ipv4_parses() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let ip = ipv4(&mut rng);
            assert!(ip.parse::<std::net::Ipv4Addr>().is_ok(), "{}", ip);
        }
    }

    #[test]
    fn test_username_shape() {
        let name = username(&mut StdRng::seed_from_u64(2));
        let split = name.find(|c: char| c.is_ascii_digit()).unwrap();
        assert!(name[..split].chars().all(|c| c.is_ascii_alphabetic()));
        assert!(name[split..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_user_id_range() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            assert!((1_000..=99_999_999).contains(&user_id(&mut rng)));
        }
    }

    #[test]
    fn test_uuid_is_v4() {
        let id = uuid(&mut StdRng::seed_from_u64(3));
        let parsed = Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn test_domain_and_url() {
        let mut rng = StdRng::seed_from_u64(4);
        let domain = domain_name(&mut rng);
        assert!(domain.contains('.'));

        let url = url(&mut rng, "/a/b");
        assert!(url.starts_with("http"));
        assert!(url.ends_with("/a/b"));
    }
}
