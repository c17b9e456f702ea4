use clap::{ArgAction, Args as ClapArgs, Parser as ClapParser, Subcommand as ClapSubcommand, ValueEnum};
use ethtx_common::{
    Address, H512, U256,
    config::SignerConfig,
    message::MessageType,
    types::Transaction,
    wallet::{
        TxRequest, address_from_private_key, decode_hex, encode_hex, parse_chain_id,
        sign_message_hex, sign_raw_transaction, sign_transaction, valid_signed_transaction,
        verify_message,
    },
};
use serde_json::Value;
use tracing::{Level, debug, info};

pub const VERSION_STRING: &str = env!("CARGO_PKG_VERSION");

#[allow(clippy::upper_case_acronyms)]
#[derive(ClapParser)]
#[command(name = "ethtx", version = VERSION_STRING, about = "Build, sign, decode and verify Ethereum transactions", long_about = None)]
pub struct CLI {
    #[clap(flatten)]
    pub opts: Options,
    #[command(subcommand)]
    pub command: Subcommand,
}

#[derive(ClapParser)]
pub struct Options {
    #[arg(
        long = "log.level",
        default_value_t = Level::WARN,
        value_name = "LOG_LEVEL",
        global = true
    )]
    pub log_level: Level,
}

/// Signing key and request defaults. Without `--private-key` the whole
/// configuration comes from the `ETHTX_*` environment.
#[derive(ClapArgs)]
pub struct SignerOptions {
    #[arg(long = "private-key", value_name = "PRIVATE_KEY")]
    pub private_key: Option<String>,
    #[arg(long = "chain-id", value_name = "CHAIN_ID")]
    pub chain_id: Option<u64>,
    #[arg(
        long = "no-eip155",
        action = ArgAction::SetTrue,
        help = "Sign legacy requests without replay protection"
    )]
    pub no_eip155: bool,
}

impl SignerOptions {
    fn config(&self) -> eyre::Result<SignerConfig> {
        let mut config = match &self.private_key {
            Some(private_key) => SignerConfig {
                private_key: private_key.clone(),
                chain_id: 1,
                hardfork_eip155: true,
            },
            None => SignerConfig::from_env()?,
        };
        if let Some(chain_id) = self.chain_id {
            config.chain_id = chain_id;
        }
        if self.no_eip155 {
            config.hardfork_eip155 = false;
        }
        Ok(config)
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum MessageKind {
    /// Sign a 32-byte hash as is
    EthSign,
    /// Hash with the "Ethereum Signed Message" prefix
    PersonalSign,
}

impl From<MessageKind> for MessageType {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::EthSign => MessageType::EthSign,
            MessageKind::PersonalSign => MessageType::PersonalSign,
        }
    }
}

#[derive(ClapArgs)]
pub struct MessageOptions {
    #[arg(value_name = "MESSAGE")]
    pub message: String,
    #[arg(long = "type", value_enum, default_value_t = MessageKind::PersonalSign)]
    pub kind: MessageKind,
    #[arg(
        long = "hex",
        action = ArgAction::SetTrue,
        help = "The message is 0x hex rather than text"
    )]
    pub hex: bool,
}

impl MessageOptions {
    fn bytes(&self) -> eyre::Result<Vec<u8>> {
        if self.hex {
            return Ok(decode_hex("message", &self.message)?);
        }
        Ok(self.message.as_bytes().to_vec())
    }
}

#[derive(ClapSubcommand)]
pub enum Subcommand {
    #[command(about = "Sign a JSON transaction request and print the raw transaction")]
    Sign {
        #[arg(value_name = "REQUEST_JSON")]
        request: String,
        #[command(flatten)]
        signer: SignerOptions,
    },
    #[command(name = "sign-raw", about = "Sign a serialized unsigned transaction")]
    SignRaw {
        #[arg(value_name = "RAW_TX")]
        transaction: String,
        #[command(flatten)]
        signer: SignerOptions,
    },
    #[command(about = "Decode a serialized transaction into JSON")]
    Decode {
        #[arg(value_name = "RAW_TX")]
        transaction: String,
        #[arg(
            long = "chain-id",
            value_name = "CHAIN_ID",
            help = "Chain id of an unsigned legacy transaction"
        )]
        chain_id: Option<String>,
    },
    #[command(about = "Check the signature of a serialized transaction and print its sender")]
    Verify {
        #[arg(value_name = "RAW_TX")]
        transaction: String,
        #[arg(long = "chain-id", value_name = "CHAIN_ID")]
        chain_id: Option<String>,
        #[arg(
            long = "public-key",
            value_name = "PUBLIC_KEY",
            help = "Uncompressed public key the signature must belong to"
        )]
        public_key: Option<String>,
    },
    #[command(name = "signing-hash", about = "Print the hash a signer must sign")]
    SigningHash {
        #[arg(value_name = "RAW_TX")]
        transaction: String,
        #[arg(long = "chain-id", value_name = "CHAIN_ID")]
        chain_id: Option<String>,
        #[arg(
            long = "raw",
            action = ArgAction::SetTrue,
            help = "Print the message before hashing"
        )]
        raw: bool,
    },
    #[command(about = "Print the address of a private key")]
    Address {
        #[arg(long = "private-key", value_name = "PRIVATE_KEY", env = "ETHTX_PRIVATE_KEY")]
        private_key: String,
    },
    #[command(name = "sign-message", about = "Sign a message, printing r || s || v")]
    SignMessage {
        #[command(flatten)]
        message: MessageOptions,
        #[command(flatten)]
        signer: SignerOptions,
    },
    #[command(name = "verify-message", about = "Check a message signature against an address")]
    VerifyMessage {
        #[command(flatten)]
        message: MessageOptions,
        #[arg(long = "signature", value_name = "SIGNATURE")]
        signature: String,
        #[arg(long = "address", value_name = "ADDRESS")]
        address: String,
    },
}

impl Subcommand {
    pub fn run(self) -> eyre::Result<()> {
        match self {
            Subcommand::Sign { request, signer } => {
                let config = signer.config()?;
                let request: TxRequest = serde_json::from_str(&request)?;
                let raw = sign_transaction(request, &config.signer()?, &config)?;
                println!("{raw}");
            }
            Subcommand::SignRaw {
                transaction,
                signer,
            } => {
                let config = signer.config()?;
                let chain_id = config.hardfork_eip155.then(|| config.chain_id());
                let raw = sign_raw_transaction(&transaction, &config.signer()?, chain_id)?;
                println!("{raw}");
            }
            Subcommand::Decode {
                transaction,
                chain_id,
            } => {
                let chain_id = chain_id.as_deref().map(parse_chain_id).transpose()?;
                let tx = decode(&transaction, chain_id)?;
                println!("{}", serde_json::to_string_pretty(&tx.to_json())?);
            }
            Subcommand::Verify {
                transaction,
                chain_id,
                public_key,
            } => {
                let chain_id = chain_id.as_deref().map(parse_chain_id).transpose()?;
                let public_key = public_key.as_deref().map(parse_public_key).transpose()?;
                let json = valid_signed_transaction(&transaction, chain_id, public_key.as_ref())?;

                let tx = decode(&transaction, chain_id)?;
                let sender = tx.sender()?;
                let hash = tx.hash()?;
                let mut output = serde_json::to_value(json)?;
                if let Value::Object(fields) = &mut output {
                    fields.insert("from".to_string(), Value::String(format!("{sender:#x}")));
                    fields.insert("hash".to_string(), Value::String(format!("{hash:#x}")));
                }
                info!(?sender, "Signature is valid");
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            Subcommand::SigningHash {
                transaction,
                chain_id,
                raw,
            } => {
                let chain_id = chain_id.as_deref().map(parse_chain_id).transpose()?;
                let tx = decode(&transaction, chain_id)?;
                if raw {
                    println!("{}", encode_hex(tx.signing_message()));
                } else {
                    println!("{:#x}", tx.signing_hash());
                }
            }
            Subcommand::Address { private_key } => {
                println!("{:#x}", address_from_private_key(&private_key)?);
            }
            Subcommand::SignMessage { message, signer } => {
                let signer = signer.config()?.signer()?;
                let signature =
                    sign_message_hex(&signer, message.kind.into(), &message.bytes()?)?;
                println!("{signature}");
            }
            Subcommand::VerifyMessage {
                message,
                signature,
                address,
            } => {
                let address = parse_address(&address)?;
                let valid =
                    verify_message(message.kind.into(), &message.bytes()?, &signature, address)?;
                println!("{valid}");
                if !valid {
                    eyre::bail!("signature was not made by {address:#x}");
                }
            }
        }
        Ok(())
    }
}

fn decode(transaction: &str, chain_id: Option<U256>) -> eyre::Result<Transaction> {
    let bytes = decode_hex("transaction", transaction)?;
    let tx = Transaction::from_serialized_bytes_with_chain_id(&bytes, chain_id)?;
    debug!(tx_type = %tx.tx_type(), "Decoded transaction from the command line");
    Ok(tx)
}

/// Accepts the 64-byte key or its 65-byte SEC1 form with the `0x04` tag.
fn parse_public_key(public_key: &str) -> eyre::Result<H512> {
    let bytes = decode_hex("publicKey", public_key)?;
    match bytes.as_slice() {
        [0x04, key @ ..] if key.len() == H512::len_bytes() => Ok(H512::from_slice(key)),
        key if key.len() == H512::len_bytes() => Ok(H512::from_slice(key)),
        _ => eyre::bail!("public key must be 64 bytes, got {}", bytes.len()),
    }
}

fn parse_address(address: &str) -> eyre::Result<Address> {
    let bytes = decode_hex("address", address)?;
    if bytes.len() != Address::len_bytes() {
        eyre::bail!("address must be 20 bytes, got {}", bytes.len());
    }
    Ok(Address::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sign_command() {
        let cli = CLI::try_parse_from([
            "ethtx",
            "sign",
            r#"{"nonce":"0x0"}"#,
            "--private-key",
            "0x4646464646464646464646464646464646464646464646464646464646464646",
            "--chain-id",
            "5",
            "--no-eip155",
        ])
        .unwrap();
        let Subcommand::Sign { signer, .. } = cli.command else {
            panic!("expected the sign subcommand");
        };
        let config = signer.config().unwrap();
        assert_eq!(config.chain_id, 5);
        assert!(!config.hardfork_eip155);
    }

    #[test]
    fn public_key_forms() {
        let key = "4bc2a31265153f07e70e0bab08724e6b85e217f8cd628ceb62974247bb493382ce28cab79ad7119ee1ad3ebcdb98a16805211530ecc6cfefa1b88e6dff99232a";
        let tagged = format!("0x04{key}");
        assert_eq!(
            parse_public_key(key).unwrap(),
            parse_public_key(&tagged).unwrap()
        );
        assert!(parse_public_key("0x1234").is_err());
    }

    #[test]
    fn message_bytes() {
        let message = MessageOptions {
            message: "0x6869".to_string(),
            kind: MessageKind::PersonalSign,
            hex: true,
        };
        assert_eq!(message.bytes().unwrap(), b"hi");
        assert!(parse_address("0x1234").is_err());
    }
}
