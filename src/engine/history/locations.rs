// ==========================================
// 附近农场查询
// ==========================================
// 距离为经纬度欧氏距离 × 111 km 的近似值，仅用于提示
// ==========================================

use serde::{Deserialize, Serialize};

/// 每度对应的近似公里数
pub const KM_PER_DEGREE: f64 = 111.0;

/// 已登记的农场
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl RegisteredLocation {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    /// 到给定坐标的近似距离 (km，未取整)
    pub fn distance_km(&self, latitude: f64, longitude: f64) -> f64 {
        let d_lat = (latitude - self.latitude).abs();
        let d_lon = (longitude - self.longitude).abs();
        (d_lat * d_lat + d_lon * d_lon).sqrt() * KM_PER_DEGREE
    }
}

/// 查询结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyLocation {
    pub name: String,
    pub distance_km: f64, // 保留两位小数
}

/// 内置的参考农场
pub fn default_locations() -> Vec<RegisteredLocation> {
    vec![
        RegisteredLocation::new("Fazenda São João", -22.1234, -47.5678),
        RegisteredLocation::new("Fazenda Santa Maria", -23.4567, -46.8910),
        RegisteredLocation::new("Fazenda Boa Vista", -21.9876, -48.1234),
    ]
}

/// 查找半径内的农场，按距离升序
pub fn find_nearby(
    locations: &[RegisteredLocation],
    latitude: f64,
    longitude: f64,
    radius_km: f64,
) -> Vec<NearbyLocation> {
    let mut nearby: Vec<NearbyLocation> = locations
        .iter()
        .filter_map(|loc| {
            let distance = loc.distance_km(latitude, longitude);
            (distance <= radius_km).then(|| NearbyLocation {
                name: loc.name.clone(),
                distance_km: crate::engine::stats::round_to(distance, 2),
            })
        })
        .collect();

    nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    nearby
}
