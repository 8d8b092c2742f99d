macro_rules! env_or_none {
    ($name:ident, $env:literal) => {
        pub const $name: &str = match option_env!($env) {
            Some(v) => v,
            None => "<none>",
        };
    };
}

pub const PACKAGE: &str = "sps30";
env_or_none!(VERSION, "VERGEN_BUILD_SEMVER");
env_or_none!(BUILD_TIMESTAMP, "VERGEN_BUILD_TIMESTAMP");
env_or_none!(RUSTC_VERSION, "VERGEN_RUSTC_SEMVER");
env_or_none!(RUSTC_COMMIT_HASH, "VERGEN_RUSTC_COMMIT_HASH");
