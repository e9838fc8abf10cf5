use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("umbpoll {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: umbpoll");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target: {}", option_env!("UMBPOLL_BUILD_TARGET").unwrap_or("unknown"));
    println!("profile: {}", option_env!("UMBPOLL_BUILD_PROFILE").unwrap_or("unknown"));
    println!("transport: {}", umbpoll_transport::TcpTransport::transport_name());
    println!("features: async={}, cli=true", cfg!(feature = "async"));

    Ok(SUCCESS)
}
