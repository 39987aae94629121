/*
 * Copyright Stalwart Labs Ltd. See the COPYING
 * file at the top-level directory of this distribution.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

use clap::Parser;
use smtp_probe::{
    probe::{DEFAULT_HOST, DEFAULT_PORT},
    ProbeTarget,
};

/// Check whether an SMTP server is reachable and accepts a session.
///
/// The outcome is reported on standard output only; the exit status is
/// always 0 once the probe has run.
#[derive(Parser, Debug)]
#[command(name = "smtp-probe", version)]
struct Args {
    /// Hostname or IP address of the SMTP server
    #[arg(default_value = DEFAULT_HOST)]
    host: String,

    /// TCP port of the SMTP server
    #[arg(default_value_t = DEFAULT_PORT, value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    smtp_probe::logging::init();

    let target = ProbeTarget::new(args.host, args.port);
    let mut stdout = std::io::stdout();
    let outcome = smtp_probe::probe(&target, &mut stdout).await?;
    outcome.write_summary(&mut stdout)?;

    Ok(())
}
