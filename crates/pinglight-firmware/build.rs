fn main() {
    println!("cargo:rerun-if-changed=.env");
    // Wi-Fi credentials and hosts may come from a `.env` file instead of the shell
    dotenv_build::output(dotenv_build::Config::default()).ok();
    println!(
        "cargo:rustc-env=BUILD_TIME={}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M")
    );
}
