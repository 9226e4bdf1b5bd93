use account_ledger::{Amount, BalanceUpdate, Iban, NewAccount, DEFAULT_PORT};

use clap::{Parser, Subcommand};
use hyper::body::HttpBody as _;
use hyper::Client;
use hyper::{Body, Method, Request};
use percent_encoding::{utf8_percent_encode, AsciiSet, PercentEncode, CONTROLS};
use tokio::io::{stdout, AsyncWriteExt as _};

#[derive(Parser, Debug)]
#[clap(name = "account-ledger-cli", version, about = "Issue commands")]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    #[clap(name = "hostname", long, default_value = "127.0.0.1")]
    host: String,

    #[clap(long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all accounts.
    List,
    /// Show one account.
    Get { iban: Iban },
    /// Open an account.
    Create {
        iban: Iban,
        #[clap(allow_hyphen_values = true)]
        balance: Amount,
    },
    /// Overwrite the balance of an account.
    Update {
        iban: Iban,
        #[clap(allow_hyphen_values = true)]
        balance: Amount,
    },
    /// Remove an account.
    Delete { iban: Iban },
    /// Move funds between two accounts.
    Transfer {
        #[clap(allow_hyphen_values = true)]
        amount: Amount,
        from: Iban,
        to: Iban,
    },
}

/// Characters that cannot appear verbatim in a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

fn segment(iban: &str) -> PercentEncode<'_> {
    utf8_percent_encode(iban, SEGMENT)
}

impl Command {
    fn request(self, base: &str) -> Result<Request<Body>, Box<dyn std::error::Error + Send + Sync>> {
        let (method, path, body) = match self {
            Command::List => (Method::GET, "/accounts".to_owned(), None),
            Command::Get { iban } => {
                (Method::GET, format!("/accounts/{}", segment(&iban)), None)
            }
            Command::Create { iban, balance } => (
                Method::POST,
                "/accounts".to_owned(),
                Some(serde_json::to_string(&NewAccount { iban, balance })?),
            ),
            Command::Update { iban, balance } => (
                Method::PUT,
                format!("/accounts/{}", segment(&iban)),
                Some(serde_json::to_string(&BalanceUpdate { balance })?),
            ),
            Command::Delete { iban } => {
                (Method::DELETE, format!("/accounts/{}", segment(&iban)), None)
            }
            Command::Transfer { amount, from, to } => (
                Method::GET,
                format!(
                    "/accounts/transfer/{amount}/from/{}/to/{}",
                    segment(&from),
                    segment(&to)
                ),
                None,
            ),
        };

        let builder = Request::builder()
            .method(method)
            .uri(format!("{base}{path}"));
        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body))?,
            None => builder.body(Body::empty())?,
        };

        Ok(req)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt::try_init()?;

    let cli = Cli::parse();
    let base = format!("http://{}:{}", cli.host, cli.port);
    let req = cli.command.request(&base)?;
    tracing::debug!("{} {}", req.method(), req.uri());

    let mut resp = Client::new().request(req).await?;
    println!("Response: {}", resp.status());

    while let Some(chunk) = resp.body_mut().data().await {
        stdout().write_all(&chunk?).await?;
    }
    Ok(())
}
