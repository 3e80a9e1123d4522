// Expose the compile-time target triple as a rustc env var.
//
// Cargo sets `TARGET` for build scripts. Re-exporting it lets the binary use
// `env!("TARGET")` as the default triple embedded in release file names.

fn main() {
    let target = std::env::var("TARGET")
        .expect("TARGET env var not set by Cargo. This should never happen in a normal build.");

    println!("cargo:rustc-env=TARGET={target}");
}
