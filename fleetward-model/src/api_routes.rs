macro_rules! v1_path {
    ($path:literal) => {
        concat!("/api/v1", $path)
    };
}

pub const HEALTH: &str = "/health";

/// Versioned API route definitions shared across Fleetward services
pub mod v1 {
    pub const ROOT: &str = "/api/v1";
    pub const VERSION: &str = "v1";

    pub mod manifests {
        pub const COLLECTION: &str = v1_path!("/manifests");
        pub const ITEM: &str = v1_path!("/manifests/{id}");
    }

    pub mod locations {
        pub const INGEST: &str = v1_path!("/locations");
        pub const SYNC: &str = v1_path!("/locations/sync");
        pub const VEHICLE_LATEST: &str = v1_path!("/vehicles/{id}/location");
    }

    pub mod vehicles {
        pub const MANIFESTS: &str = v1_path!("/vehicles/{id}/manifests");
    }

    pub mod panic {
        pub const TRIGGER: &str = v1_path!("/panic");
        pub const COOLDOWN: &str = v1_path!("/panic/cooldown");
        pub const ITEM: &str = v1_path!("/panic/{id}");
    }
}

/// Strip the version prefix so a constant can be mounted under a nested router.
pub fn relative_to_v1(path: &str) -> &str {
    path.strip_prefix(v1::ROOT).unwrap_or(path)
}

/// Substitute a `{param}` placeholder.
pub fn replace_param(path: &str, param: &str, value: &str) -> String {
    path.replace(param, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_drop_the_version_prefix() {
        assert_eq!(relative_to_v1(v1::manifests::ITEM), "/manifests/{id}");
        assert_eq!(relative_to_v1(HEALTH), "/health");
    }
}
