pub const SELECT_RECENT_ACTIVITY_LOCATIONS: &str = r#"
SELECT l.latitude, l.longitude
FROM activities a
JOIN locations l ON l.id = a.location_id
WHERE a.user_id = $1
  AND a.location_id IS NOT NULL
  AND a.timestamp >= NOW() - make_interval(days => $2)
ORDER BY a.timestamp DESC;
"#;

pub const SELECT_DEVICE_MOTION: &str = r#"
SELECT motion_data, last_updated FROM devices WHERE user_id = $1;
"#;
