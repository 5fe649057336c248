//! taskmate serve command implementation

use std::io;

use super::Context;
use crate::error::Result;
use crate::server::Server;

pub fn run(context: Context) -> Result<()> {
    let server = Server::new(context.store, context.config.server);
    let stdin = io::stdin();
    let stdout = io::stdout();
    server.run(stdin.lock(), stdout.lock())
}
