//! Ethereum keystore CLI
//!
//! Usage:
//!   evm_keystore new                        # Create an encrypted key in ./keystore
//!   evm_keystore address                    # Unlock and print the address
//!   evm_keystore sign "hello"               # Sign a message
//!   evm_keystore verify "hello" 0x...       # Recover the signer
//!   evm_keystore check                      # Sign/recover self-check
//!   evm_keystore kind 0x... -r nodes.json   # Classify an address

use std::path::Path;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use evm_keystore::config::Command;
use evm_keystore::password::{FilePassword, PasswordSource, PromptPassword};
use evm_keystore::wallet::MAX_PASSWORD_ATTEMPTS;
use evm_keystore::{
    classify, self_check, verify, with_password_retries, Address, Config, KeyDir, Registry,
    Signature, Wallet,
};

fn main() {
    let config = Config::parse();

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        process::exit(1);
    }

    init_logging(&config.log_level);

    if let Err(e) = run(&config) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns the password source and how many attempts it gets.
///
/// A password file gives the same answer every time, so only the
/// interactive prompt is asked again.
fn password_source(config: &Config) -> (Box<dyn PasswordSource>, usize) {
    match config.resolved_password_file() {
        Some(path) => {
            let source: Box<dyn PasswordSource> = Box::new(FilePassword::new(path));
            (source, 1)
        }
        None => {
            let source: Box<dyn PasswordSource> = Box::new(PromptPassword);
            (source, MAX_PASSWORD_ATTEMPTS)
        }
    }
}

fn open_wallet(config: &Config, file: Option<&Path>) -> evm_keystore::Result<Wallet> {
    let (mut passwords, attempts) = password_source(config);
    let dir = KeyDir::new(&config.keystore);
    with_password_retries(attempts, || match file {
        Some(path) => Wallet::open(path, passwords.as_mut()),
        None => Wallet::unlock(&dir, passwords.as_mut()),
    })
}

fn run(config: &Config) -> evm_keystore::Result<()> {
    match &config.command {
        Command::New { .. } => {
            let dir = KeyDir::new(&config.keystore);
            let (mut passwords, attempts) = password_source(config);
            let wallet = with_password_retries(attempts, || {
                Wallet::create(&dir, passwords.as_mut(), config.scrypt_params())
            })?;

            println!("Path:    {}", wallet.path().display());
            println!("Address: {}", wallet.address());
        }
        Command::Address { file } => {
            let wallet = open_wallet(config, file.as_deref())?;
            println!("{}", wallet.address());
        }
        Command::Sign { message, file } => {
            let wallet = open_wallet(config, file.as_deref())?;
            let signature = wallet.sign(message.as_bytes());

            println!("Address:   {}", wallet.address());
            println!("Signature: {}", signature);
        }
        Command::Verify {
            message,
            signature,
            expect,
        } => {
            let signature: Signature = signature.parse()?;
            let signer = verify(message.as_bytes(), &signature)?;
            println!("Signer: {}", signer);

            if let Some(expect) = expect {
                let expected: Address = expect.parse()?;
                if signer != expected {
                    return Err(evm_keystore::Error::InvalidSignature(format!(
                        "signed by {}, expected {}",
                        signer, expected
                    )));
                }
                println!("Signature matches {}", expected);
            }
        }
        Command::Check => {
            let wallet = open_wallet(config, None)?;
            let check = self_check(wallet.keypair())?;

            println!("Key file:  {}", wallet.path().display());
            println!("Address:   {}", check.address);
            println!("Signature: 0x{}", check.signature_hex);
            println!("Recovered: {}", check.recovered);
        }
        Command::Kind { address, registry } => {
            let registry = Registry::load(registry)?;
            let kind = classify(address, &registry);
            println!("{} ({})", kind, kind.code());
        }
    }

    Ok(())
}
