fn main() {
    // Tell Cargo that if the given file changes, to rerun this build script.
    println!("cargo:rerun-if-changed=src/crc4.c");
    // Reference CRC-4 routine from the application note, linked so the unit
    // tests can cross-check the rust implementation against it.
    cc::Build::new().file("src/crc4.c").compile("crc4");
}
