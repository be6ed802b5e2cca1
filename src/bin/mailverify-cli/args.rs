use clap::{Args, Parser, Subcommand, ValueEnum};
use mailverify::{VerificationOptions, VerifierConfig};

#[derive(Parser)]
#[command(name = "mailverify-cli", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,

    /// lit aussi des entrées depuis stdin (une par ligne)
    #[arg(long, global = true)]
    pub stdin: bool,

    /// format de sortie
    #[arg(long, value_enum, default_value_t = Format::Human, global = true)]
    pub format: Format,

    /// écrit le rapport dans un fichier au lieu de stdout
    #[arg(long, global = true)]
    pub out: Option<String>,

    /// logs de debug sur stderr (RUST_LOG prend le pas)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Human,
    Json,
    Ndjson,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Vérification complète: syntaxe, typo, MX, sonde SMTP
    Verify {
        emails: Vec<String>,
        #[command(flatten)]
        probe: ProbeArgs,
    },
    /// Syntaxe seule, sans réseau
    Syntax { emails: Vec<String> },
    /// Propose une correction de domaine
    Suggest { emails: Vec<String> },
    /// Résout les enregistrements MX d'un domaine
    Mx { domains: Vec<String> },
}

#[derive(Args)]
pub struct ProbeArgs {
    /// saute la résolution MX (réactivée si la sonde SMTP est demandée)
    #[arg(long)]
    pub no_mx: bool,

    /// saute la sonde SMTP
    #[arg(long)]
    pub no_smtp: bool,

    /// délai de connexion et de lecture par sonde (ms)
    #[arg(long = "timeout", env = "MAILVERIFY_TIMEOUT_MS", default_value_t = 2_500)]
    pub timeout_ms: u64,

    /// nombre maximum d'MX interrogés
    #[arg(long = "max-servers", default_value_t = 2)]
    pub max_servers: usize,

    /// nom utilisé pour EHLO (par défaut le domaine testé)
    #[arg(long, env = "MAILVERIFY_HELO")]
    pub helo: Option<String>,

    /// enveloppe MAIL FROM (par défaut postmaster@domaine)
    #[arg(long = "from", env = "MAILVERIFY_FROM")]
    pub mail_from: Option<String>,

    /// ports sondés en parallèle (répétable, défaut 25 587 465)
    #[arg(long = "port")]
    pub ports: Vec<u16>,
}

impl ProbeArgs {
    pub fn options(&self) -> VerificationOptions {
        VerificationOptions {
            check_mx: !self.no_mx,
            check_smtp: !self.no_smtp,
            timeout_ms: self.timeout_ms,
            max_server_attempts: self.max_servers,
        }
    }

    pub fn config(&self) -> VerifierConfig {
        let mut config = VerifierConfig::default();
        if let Some(helo) = &self.helo {
            config = config.with_helo_domain(helo.clone());
        }
        if let Some(from) = &self.mail_from {
            config = config.with_envelope_sender(from.clone());
        }
        if !self.ports.is_empty() {
            config = config.with_ports(self.ports.clone());
        }
        config
    }
}

impl Commands {
    /// Positional inputs of the subcommand.
    pub fn inputs(&self) -> &[String] {
        match self {
            Self::Verify { emails, .. } | Self::Syntax { emails } | Self::Suggest { emails } => {
                emails.as_slice()
            }
            Self::Mx { domains } => domains.as_slice(),
        }
    }
}
