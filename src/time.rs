// Copyright (c) 2024-present, paldb contributors
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// Gets the unix timestamp as a duration
#[expect(clippy::expect_used, reason = "trivial")]
pub fn unix_timestamp() -> std::time::Duration {
    let now = std::time::SystemTime::now();

    now.duration_since(std::time::SystemTime::UNIX_EPOCH)
        .expect("time went backwards")
}
