// Build script for flutter_rust_bridge code generation
//
// flutter_rust_bridge v2 code generation is run via the CLI tool:
//   flutter_rust_bridge_codegen generate
//
// The generated files are:
// - lib/bridge/api.dart (Dart bindings for the step tracker API)
// - rust/src/frb_generated.rs (Rust FFI glue code)
//
// Running codegen from build.rs interferes with plain cargo builds, so this
// script only tracks the API surface for rebuilds.

fn main() {
    println!("cargo:rerun-if-changed=src/api.rs");
    println!("cargo:rerun-if-changed=src/api");
}
