fn main() {
  if let Err(e) = annual_plan_lib::run() {
    eprintln!("{}", e);
    std::process::exit(1);
  }
}
