//! ID 和时间工具

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a Snowflake-style i64 for use as resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2025-01-01 UTC (~69 years)
///   - 12 bits: random (4096 values per ms)
///
/// Used for every row ID so that rows created on different nodes never
/// collide and sort roughly by creation time.
pub fn snowflake_id() -> i64 {
    use rand::Rng;
    // Custom epoch: 2025-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_735_689_600_000;
    let now = now_millis();
    let ts = (now - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000); // 12 bits
    (ts << 12) | rand_bits
}

/// Build a human-facing order number from an order ID.
///
/// Format: `ORD<yyyymmdd><id mod 1_000_000>` in UTC. The numeric suffix
/// comes from the snowflake ID, so two orders created the same day get
/// distinct suffixes (enforced by a UNIQUE index on the column).
pub fn order_no(id: i64) -> String {
    let date_str = chrono::Utc::now().format("%Y%m%d").to_string();
    format!("ORD{}{}", date_str, id % 1_000_000)
}
