#![no_main]

use clipmark_player::{Direction, FavoriteStore, FavoritesConfig};
use clipmark_web::MemoryStorage;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    let mut storage = MemoryStorage::new();
    storage.insert_raw("favorites:clip.mp4", raw);

    let mut store = FavoriteStore::new(FavoritesConfig::default());
    let loaded = store.load("clip.mp4", &storage);
    assert_eq!(loaded, store.len());
    for &t in store.times() {
        assert!(t.is_finite() && t >= 0.0, "bad stored time {t}");
    }

    for current in [0.0, 1.0, 1e9] {
        if let Some(t) = store.navigate(Direction::Forward, current) {
            assert!(t > current);
        }
        if let Some(t) = store.navigate(Direction::Backward, current) {
            assert!(t < current || t == 0.0);
        }
    }

    store.save(&mut storage).expect("saving to unbounded storage");
});
