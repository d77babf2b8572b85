use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "tracepath-ng")]
#[command(about = "Trace the IPv4 path to a host with ICMP echo probes of increasing TTL")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Target hostname or IP address
    pub target: String,

    /// Reply timeout per hop in seconds
    #[arg(short = 'i', default_value_t = 4, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Maximum number of hops
    #[arg(short = 't', default_value_t = 64, value_parser = clap::value_parser!(u8).range(1..))]
    pub max_hops: u8,

    /// Probe payload size in bytes
    #[arg(short = 's', default_value_t = 64)]
    pub payload_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_default_values() {
        let args = Args::try_parse_from(["tracepath-ng", "example.com"]).unwrap();
        assert_eq!(args.target, "example.com");
        assert_eq!(args.timeout, 4);
        assert_eq!(args.max_hops, 64);
        assert_eq!(args.payload_size, 64);
    }

    #[test]
    fn test_args_custom_values() {
        let args = Args::try_parse_from([
            "tracepath-ng",
            "-i",
            "2",
            "-t",
            "30",
            "-s",
            "128",
            "google.com",
        ])
        .unwrap();

        assert_eq!(args.target, "google.com");
        assert_eq!(args.timeout, 2);
        assert_eq!(args.max_hops, 30);
        assert_eq!(args.payload_size, 128);
    }

    #[test]
    fn test_args_target_required() {
        assert!(Args::try_parse_from(["tracepath-ng"]).is_err());
    }

    #[test]
    fn test_args_rejects_zero_timeout() {
        assert!(Args::try_parse_from(["tracepath-ng", "-i", "0", "example.com"]).is_err());
    }

    #[test]
    fn test_args_rejects_zero_max_hops() {
        assert!(Args::try_parse_from(["tracepath-ng", "-t", "0", "example.com"]).is_err());
    }

    #[test]
    fn test_args_accepts_empty_payload() {
        let args = Args::try_parse_from(["tracepath-ng", "-s", "0", "example.com"]).unwrap();
        assert_eq!(args.payload_size, 0);
    }
}
