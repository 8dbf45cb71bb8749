fn main() {
    // Node addon link flags are only needed when the N-API surface is compiled in.
    if std::env::var("CARGO_FEATURE_NAPI").is_ok() {
        napi_build::setup();
    }
}
