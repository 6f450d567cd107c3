use lifeview::prelude::*;

fn main() {
    let result = match std::env::args().nth(1) {
        Some(path) => run_config_file(path),
        None => run(ViewerConfig::default()),
    };

    if let Err(err) = result {
        eprintln!("life viewer failed: {}", err);
        std::process::exit(1);
    }
}
