use lumen::Config;

fn main() {
    if let Err(e) = lumen::run(Config::default()) {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}
