// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use clap::Parser;

use crate::cmd::check::check_collection;
use crate::cmd::flip::flip_day;
use crate::cmd::serve::server::start_server;
use crate::cmd::show::show_calendar;
use crate::cmd::status::StatusFormat;
use crate::cmd::status::print_status;
use crate::error::Fallible;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Check that the configuration is valid.
    Check {
        /// Path to the configuration file. Defaults to `flipdays.toml` in the current directory.
        #[arg(long)]
        config: Option<String>,
    },
    /// Print a calendar's notes and progress.
    Show {
        /// The calendar to show. Defaults to the default calendar.
        slug: Option<String>,
        /// Path to the configuration file.
        #[arg(long)]
        config: Option<String>,
        /// Pretend today is this date (YYYY-MM-DD).
        #[arg(long)]
        today: Option<String>,
    },
    /// Print a calendar's progress.
    Status {
        /// The calendar. Defaults to the default calendar.
        slug: Option<String>,
        /// Output format.
        #[arg(long, default_value_t = StatusFormat::Text)]
        format: StatusFormat,
        /// Path to the configuration file.
        #[arg(long)]
        config: Option<String>,
        /// Pretend today is this date (YYYY-MM-DD).
        #[arg(long)]
        today: Option<String>,
    },
    /// Flip a day, or flip it back.
    Flip {
        /// The calendar.
        slug: String,
        /// A day index or a date (YYYY-MM-DD).
        day: String,
        /// Path to the configuration file.
        #[arg(long)]
        config: Option<String>,
        /// Pretend today is this date (YYYY-MM-DD).
        #[arg(long)]
        today: Option<String>,
    },
    /// Serve the web board.
    Serve {
        /// Path to the configuration file.
        #[arg(long)]
        config: Option<String>,
        /// The port to listen on.
        #[arg(long, default_value_t = 8000)]
        port: u16,
        /// Don't open the browser.
        #[arg(long)]
        no_open: bool,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Check { config } => check_collection(config),
        Command::Show {
            slug,
            config,
            today,
        } => show_calendar(config, slug, today),
        Command::Status {
            slug,
            format,
            config,
            today,
        } => print_status(config, slug, today, format),
        Command::Flip {
            slug,
            day,
            config,
            today,
        } => flip_day(config, slug, day, today),
        Command::Serve {
            config,
            port,
            no_open,
        } => start_server(config, port, !no_open).await,
    }
}
