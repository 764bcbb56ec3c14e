use clap::{Args, Parser, Subcommand};

fn key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEYID=VALUE, got '{raw}'"))
}

#[derive(Args)]
pub struct ParseInputArgs {
    /// The `Signature-Input` header value to parse
    pub header: String,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Request target, either origin-form (`/path?query`) or an absolute URI
    #[arg(long)]
    pub uri: String,

    /// Request method
    #[arg(default_value = "GET", long, short = 'X')]
    pub method: String,

    /// Additional request header
    #[arg(long = "header", short = 'H', value_name = "NAME: VALUE")]
    pub headers: Vec<String>,

    /// Value of the `Signature-Input` header
    #[arg(long)]
    pub signature_input: Option<String>,

    /// Value of the `Signature` header
    #[arg(long)]
    pub signature: Option<String>,

    /// Register a shared HMAC-SHA256 secret
    #[arg(long = "hmac", value_name = "KEYID=SECRET", value_parser = key_value)]
    pub hmac_keys: Vec<(String, String)>,

    /// Register an RSA or P-256 public key from a PEM file
    #[arg(long = "public-key", value_name = "KEYID=PEM_PATH", value_parser = key_value)]
    pub public_keys: Vec<(String, String)>,
}

#[derive(Subcommand)]
pub enum ToolSubcommand {
    /// Parse a `Signature-Input` header and report any format errors
    ParseInput(ParseInputArgs),

    /// Assemble a request from the arguments and verify its signature
    Verify(VerifyArgs),
}

#[derive(Parser)]
#[command(about, version)]
pub struct ToolArgs {
    #[clap(subcommand)]
    pub subcommand: ToolSubcommand,
}
