/// Returns the next poll interval for a channel based on its live status
/// and the time since the last observed audience activity.
///
/// Live channels with recent activity are polled fastest; offline channels
/// settle on a slow idle cadence.
pub fn poll_freq(live: bool, since_activity: time::Duration) -> time::Duration {
    if !live {
        return time::Duration::seconds(120);
    }
    match since_activity {
        d if d < time::Duration::seconds(30) => time::Duration::seconds(5),
        d if d < time::Duration::minutes(5) => time::Duration::seconds(15),
        _ => time::Duration::seconds(30),
    }
}
