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

use tracing::metadata::LevelFilter;

/// Timestamp layout of the protocol trace, e.g. `14:03:27.118204`.
const TRACE_TIME_FORMAT: &str = "%H:%M:%S%.6f";

/// Installs a subscriber that prints the protocol trace and any other
/// debug output on standard output, where it interleaves with the
/// probe's status lines.
///
/// Calling this more than once keeps the first subscriber.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .with_max_level(LevelFilter::DEBUG)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::new(
            TRACE_TIME_FORMAT.to_string(),
        ))
        .with_target(false)
        .with_level(false)
        .with_ansi(false)
        .try_init();
}
