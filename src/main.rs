fn main() {
    if let Err(e) = shopfloor_lib::run() {
        eprintln!("shopfloor: {e}");
        std::process::exit(1);
    }
}
