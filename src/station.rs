use std::fmt::{self, Display};
use std::hash::{BuildHasher, Hash, Hasher};

use hashbrown::hash_map::RawEntryMut;
use hashbrown::HashMap;

use crate::hash::FnvBuildHasher;

/// Observations a single key can absorb before its `i64` sum may overflow,
/// assuming every value sits at the `i32` extreme.
pub const MAX_SAFE_COUNT: u64 = (i64::MAX / i32::MAX as i64) as u64;

const EXPECTED_STATIONS: usize = 512;

/// Running aggregate of one station, values scaled by 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Station {
    pub min: i32,
    pub max: i32,
    pub sum: i64,
    pub count: u64,
}

impl Station {
    #[inline]
    pub fn new(value: i32) -> Self {
        Station {
            min: value,
            max: value,
            sum: value as i64,
            count: 1,
        }
    }

    #[inline]
    pub fn update(&mut self, value: i32) {
        self.sum += value as i64;
        self.count += 1;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn union(&mut self, other: &Station) {
        self.sum += other.sum;
        self.count += other.count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Mean with the fixed-point scale undone.
    pub fn mean(&self) -> f64 {
        (self.sum as f64 / 10.0) / self.count as f64
    }
}

impl Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:.1}/{:.1}/{:.1}",
            self.min as f64 / 10.0,
            self.mean(),
            self.max as f64 / 10.0,
        )
    }
}

/// Owned copy of a station name. Hashes as a single `write` of its bytes so
/// the digest matches [`crate::hash::fnv1a`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct StationName(Box<[u8]>);

impl StationName {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for StationName {
    fn from(bytes: &[u8]) -> Self {
        StationName(bytes.into())
    }
}

impl Hash for StationName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write(&self.0);
    }
}

impl Display for StationName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for StationName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.0))
    }
}

/// Station name to aggregate grouping.
///
/// Lookups go by digest and then compare the full name, so two names that
/// share a digest still land in separate entries.
#[derive(Debug, Clone)]
pub struct StationMap<S = FnvBuildHasher> {
    map: HashMap<StationName, Station, S>,
}

impl<S: BuildHasher + Default> Default for StationMap<S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl StationMap {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: BuildHasher> StationMap<S> {
    pub fn with_hasher(hasher: S) -> Self {
        StationMap {
            map: HashMap::with_capacity_and_hasher(EXPECTED_STATIONS, hasher),
        }
    }

    #[inline]
    fn hash_name(&self, name: &[u8]) -> u64 {
        let mut hasher = self.map.hasher().build_hasher();
        hasher.write(name);
        hasher.finish()
    }

    /// Folds one observation in, copying the name only on first sight.
    #[inline]
    pub fn record(&mut self, name: &[u8], value: i32) {
        let hash = self.hash_name(name);
        match self
            .map
            .raw_entry_mut()
            .from_hash(hash, |key| key.as_bytes() == name)
        {
            RawEntryMut::Occupied(mut entry) => entry.get_mut().update(value),
            RawEntryMut::Vacant(entry) => {
                entry.insert_hashed_nocheck(hash, StationName::from(name), Station::new(value));
            }
        }
    }

    /// Folds a whole aggregate in, taking ownership of the name when it is new.
    pub fn merge_station(&mut self, name: StationName, station: Station) {
        let hash = self.hash_name(name.as_bytes());
        match self
            .map
            .raw_entry_mut()
            .from_hash(hash, |key| *key == name)
        {
            RawEntryMut::Occupied(mut entry) => entry.get_mut().union(&station),
            RawEntryMut::Vacant(entry) => {
                entry.insert_hashed_nocheck(hash, name, station);
            }
        }
    }

    pub fn merge(&mut self, other: StationMap<S>) {
        for (name, station) in other.map {
            self.merge_station(name, station);
        }
    }

    pub fn get(&self, name: &[u8]) -> Option<&Station> {
        let hash = self.hash_name(name);
        self.map
            .raw_entry()
            .from_hash(hash, |key| key.as_bytes() == name)
            .map(|(_, station)| station)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<S> IntoIterator for StationMap<S> {
    type Item = (StationName, Station);
    type IntoIter = hashbrown::hash_map::IntoIter<StationName, Station>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.into_iter()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::hash::fnv1a;

    /// Sends every name to the same bucket.
    #[derive(Debug, Clone, Copy, Default)]
    pub(crate) struct CollidingHasher;

    impl Hasher for CollidingHasher {
        fn finish(&self) -> u64 {
            0
        }
        fn write(&mut self, _bytes: &[u8]) {}
    }

    impl BuildHasher for CollidingHasher {
        type Hasher = CollidingHasher;
        fn build_hasher(&self) -> CollidingHasher {
            CollidingHasher
        }
    }

    fn map_of(records: &[(&str, i32)]) -> StationMap {
        let mut map = StationMap::new();
        for (name, value) in records {
            map.record(name.as_bytes(), *value);
        }
        map
    }

    #[test]
    fn test_update() {
        let mut station = Station::new(120);
        station.update(80);
        station.update(100);
        assert_eq!(
            station,
            Station {
                min: 80,
                max: 120,
                sum: 300,
                count: 3
            }
        );
        assert_eq!(station.to_string(), "8.0/10.0/12.0");
    }

    #[test]
    fn test_update_first_value_can_move_both_bounds() {
        let mut station = Station::new(0);
        station.update(-5);
        station.update(5);
        assert_eq!((station.min, station.max), (-5, 5));
    }

    #[test]
    fn test_single_measurement_identity() {
        let station = Station::new(-34);
        assert_eq!(station.to_string(), "-3.4/-3.4/-3.4");
    }

    #[test]
    fn test_default_digest_is_fnv() {
        let map = StationMap::new();
        assert_eq!(map.hash_name(b"Hamburg"), fnv1a(b"Hamburg"));
        assert_eq!(
            FnvBuildHasher.hash_one(StationName::from(&b"Hamburg"[..])),
            fnv1a(b"Hamburg")
        );
    }

    #[test]
    fn test_record_and_get() {
        let map = map_of(&[("Hamburg", 120), ("Berlin", 55), ("Hamburg", 80)]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(b"Berlin"), Some(&Station::new(55)));
        assert_eq!(map.get(b"Hamburg").map(|s| s.count), Some(2));
        assert_eq!(map.get(b"Paris"), None);
    }

    #[test]
    fn test_merge_order_invariant() {
        let parts = [
            map_of(&[("a", 1), ("b", -20), ("a", 7)]),
            map_of(&[("b", 30), ("c", 0)]),
            map_of(&[("a", -4), ("c", 99), ("c", -99)]),
        ];
        let orders: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];

        let combine = |order: &[usize; 3]| {
            let mut combined = StationMap::new();
            for &i in order {
                combined.merge(parts[i].clone());
            }
            let mut entries = combined.into_iter().collect::<Vec<_>>();
            entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
            entries
        };

        let expected = combine(&orders[0]);
        assert_eq!(expected.len(), 3);
        for order in &orders[1..] {
            assert_eq!(combine(order), expected);
        }
    }

    #[test]
    fn test_colliding_names_stay_separate() {
        let mut map = StationMap::with_hasher(CollidingHasher);
        map.record(b"Hamburg", 120);
        map.record(b"Berlin", 55);
        map.record(b"Hamburg", 80);
        map.record(b"Berlin", -5);

        assert_eq!(map.len(), 2);
        assert_eq!(
            map.get(b"Hamburg"),
            Some(&Station {
                min: 80,
                max: 120,
                sum: 200,
                count: 2
            })
        );
        assert_eq!(
            map.get(b"Berlin"),
            Some(&Station {
                min: -5,
                max: 55,
                sum: 50,
                count: 2
            })
        );

        let mut other = StationMap::with_hasher(CollidingHasher);
        other.record(b"Oslo", 10);
        other.record(b"Berlin", 100);
        map.merge(other);
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(b"Berlin").map(|s| (s.max, s.count)), Some((100, 3)));
        assert_eq!(map.get(b"Oslo"), Some(&Station::new(10)));
    }

    #[test]
    fn test_max_safe_count_is_exact() {
        let extreme = i32::MAX as i64;
        assert_eq!(MAX_SAFE_COUNT, 4_294_967_298);
        assert!(extreme.checked_mul(MAX_SAFE_COUNT as i64).is_some());
        assert!(extreme.checked_mul(MAX_SAFE_COUNT as i64 + 1).is_none());
        assert!((-extreme).checked_mul(MAX_SAFE_COUNT as i64).is_some());
    }

    #[test]
    fn test_union_at_safe_bound() {
        let half = MAX_SAFE_COUNT / 2;
        let mut a = Station {
            min: i32::MAX,
            max: i32::MAX,
            sum: i32::MAX as i64 * half as i64,
            count: half,
        };
        let b = a;
        a.union(&b);
        assert_eq!(a.count, MAX_SAFE_COUNT);
        assert_eq!(a.sum, i32::MAX as i64 * MAX_SAFE_COUNT as i64);
    }
}
