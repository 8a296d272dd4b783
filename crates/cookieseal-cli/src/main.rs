//! Cookieseal command-line tool.
//!
//! # Usage
//!
//! ```bash
//! # Generate a 32-byte hash key and a 16-byte block key
//! cookieseal keygen --length 32
//! cookieseal keygen --length 16
//!
//! # Encode a JSON value
//! cookieseal encode --hash-key <KEY> --block-key <KEY> --name sid '{"user":"alice"}'
//!
//! # Decode it again
//! cookieseal decode --hash-key <KEY> --block-key <KEY> --name sid <TOKEN>
//! ```
//!
//! Keys are passed as unpadded URL-safe base64, the same form `keygen` prints.

use std::{
    io::{self, Write},
    time::Duration,
};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use clap::{Args, Parser, Subcommand, ValueEnum};
use cookieseal_core::{
    Codec, CodecConfig, CodecError, JsonSerializer, MacAlgorithm, Serializer, generate_random_key,
};
use cookieseal_crypto::CryptoError;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Cookieseal token tool
#[derive(Parser, Debug)]
#[command(name = "cookieseal")]
#[command(about = "Generate keys and encode or decode cookieseal tokens")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print random keys
    Keygen {
        /// Key length in bytes (16, 24 or 32 for block keys)
        #[arg(short, long, default_value = "32")]
        length: usize,

        /// Number of keys to print
        #[arg(short, long, default_value = "1")]
        count: usize,
    },

    /// Encode a JSON value into a token
    Encode {
        #[command(flatten)]
        codec: CodecArgs,

        /// Value to encode, as JSON
        value: String,
    },

    /// Decode a token and print its value as JSON
    Decode {
        #[command(flatten)]
        codec: CodecArgs,

        /// Token to decode
        #[arg(allow_hyphen_values = true)]
        token: String,
    },
}

#[derive(Args, Debug)]
struct CodecArgs {
    /// Hash key (base64url)
    #[arg(long, allow_hyphen_values = true)]
    hash_key: String,

    /// Block key (base64url); enables encryption
    #[arg(long, allow_hyphen_values = true)]
    block_key: Option<String>,

    /// Token name the MAC is bound to
    #[arg(short, long)]
    name: String,

    /// Maximum token age in seconds (0 disables)
    #[arg(long, default_value = "2592000")]
    max_age: u64,

    /// Maximum token length in bytes (0 disables)
    #[arg(long, default_value = "4096")]
    max_length: usize,

    /// Payload format
    #[arg(long, value_enum, default_value_t = Format::Cbor)]
    format: Format,

    /// MAC algorithm
    #[arg(long, value_enum, default_value_t = Mac::Sha256)]
    mac: Mac,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Cbor,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mac {
    Sha256,
    Sha512,
}

/// CLI failures.
#[derive(Debug, Error)]
enum CliError {
    #[error("{which} is not valid base64url")]
    KeyEncoding { which: &'static str },

    #[error("value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CodecArgs {
    fn build(&self) -> Result<Codec, CliError> {
        let hash_key = decode_key(&self.hash_key, "hash key")?;
        let block_key =
            self.block_key.as_deref().map(|key| decode_key(key, "block key")).transpose()?;

        let config = CodecConfig {
            max_age: Duration::from_secs(self.max_age),
            max_length: self.max_length,
            mac: match self.mac {
                Mac::Sha256 => MacAlgorithm::HmacSha256,
                Mac::Sha512 => MacAlgorithm::HmacSha512,
            },
            ..CodecConfig::default()
        };

        Ok(Codec::with_config(&hash_key, block_key.as_deref(), config)?)
    }
}

fn decode_key(encoded: &str, which: &'static str) -> Result<Vec<u8>, CliError> {
    URL_SAFE_NO_PAD.decode(encoded).map_err(|_| CliError::KeyEncoding { which })
}

fn encode<S: Serializer>(codec: &Codec<S>, name: &str, value: &str) -> Result<String, CliError> {
    let value: serde_json::Value = serde_json::from_str(value)?;
    Ok(codec.encode(name, &value)?)
}

fn decode<S: Serializer>(codec: &Codec<S>, name: &str, token: &str) -> Result<String, CliError> {
    let value: serde_json::Value = codec.decode(name, token)?;
    Ok(value.to_string())
}

fn run(command: Command, out: &mut impl Write) -> Result<(), CliError> {
    match command {
        Command::Keygen { length, count } => {
            for _ in 0..count {
                let key = generate_random_key(length)?;
                writeln!(out, "{}", URL_SAFE_NO_PAD.encode(key))?;
            }
        },
        Command::Encode { codec, value } => {
            let base = codec.build()?;
            let token = match codec.format {
                Format::Cbor => encode(&base, &codec.name, &value)?,
                Format::Json => encode(&base.with_serializer(JsonSerializer), &codec.name, &value)?,
            };
            tracing::info!(name = %codec.name, length = token.len(), "encoded token");
            writeln!(out, "{token}")?;
        },
        Command::Decode { codec, token } => {
            let base = codec.build()?;
            let json = match codec.format {
                Format::Cbor => decode(&base, &codec.name, &token)?,
                Format::Json => decode(&base.with_serializer(JsonSerializer), &codec.name, &token)?,
            };
            writeln!(out, "{json}")?;
        },
    }
    Ok(())
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let mut out = io::stdout().lock();
    run(cli.command, &mut out).inspect_err(|err| tracing::error!(%err, "command failed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec_args(extra: &[&str]) -> CodecArgs {
        let hash_key = URL_SAFE_NO_PAD.encode(b"hash-key");
        let mut argv =
            vec!["cookieseal", "encode", "--hash-key", hash_key.as_str(), "--name", "sid"];
        argv.extend_from_slice(extra);
        argv.push("{}");

        match Cli::parse_from(argv).command {
            Command::Encode { codec, .. } => codec,
            other => panic!("unexpected command {other:?}"),
        }
    }

    fn run_to_string(command: Command) -> String {
        let mut out = Vec::new();
        run(command, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn keygen_prints_requested_keys() {
        let output = run_to_string(Command::Keygen { length: 16, count: 3 });
        let keys: Vec<&str> = output.lines().collect();

        assert_eq!(keys.len(), 3);
        for key in keys {
            assert_eq!(URL_SAFE_NO_PAD.decode(key).unwrap().len(), 16);
        }
    }

    #[test]
    fn encode_then_decode() {
        let block_key = URL_SAFE_NO_PAD.encode(b"1234567890123456");
        for format in ["cbor", "json"] {
            let args = || codec_args(&["--block-key", block_key.as_str(), "--format", format]);

            let token = run_to_string(Command::Encode {
                codec: args(),
                value: r#"{"user":"alice","n":3}"#.to_string(),
            });
            let json = run_to_string(Command::Decode {
                codec: args(),
                token: token.trim_end().to_string(),
            });

            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value, serde_json::json!({"user": "alice", "n": 3}));
        }
    }

    #[test]
    fn rejects_bad_keys() {
        let short = URL_SAFE_NO_PAD.encode(b"short");
        let err = codec_args(&["--block-key", short.as_str()]).build().unwrap_err();
        assert!(matches!(err, CliError::Codec(CodecError::InvalidBlockKey(_))));

        let err = codec_args(&["--block-key", "!!"]).build().unwrap_err();
        assert!(matches!(err, CliError::KeyEncoding { which: "block key" }));
    }

    #[test]
    fn rejects_invalid_json() {
        let mut out = Vec::new();
        let command = Command::Encode { codec: codec_args(&[]), value: "{".to_string() };
        let result = run(command, &mut out);

        assert!(matches!(result, Err(CliError::Json(_))));
    }
}
