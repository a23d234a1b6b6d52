//! Carousel layout - which three ROMs are on screen and how they look
//!
//! The renderer in `ui` only draws what [`CarouselView`] describes, so the
//! selection and title rules live here and stay testable without a window.

use crate::config::Config;
use crate::library::{artwork_for, rom_stem, RomLibrary};
use std::path::PathBuf;

/// Titles longer than this are truncated
pub const MAX_TITLE_CHARS: usize = 23;
/// Characters kept before the ellipsis when truncating
pub const TRUNCATED_TITLE_CHARS: usize = 20;

/// Side pane artwork size
pub const SIDE_SIZE: [u32; 2] = [250, 250];
/// Center pane artwork size
pub const CENTER_SIZE: [u32; 2] = [400, 400];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRole {
    Left,
    Center,
    Right,
}

/// One pane of the carousel
#[derive(Debug, Clone, PartialEq)]
pub struct CarouselSlot {
    pub role: SlotRole,
    /// Index into the library
    pub index: usize,
    pub rom_name: String,
    pub title: String,
    pub artwork: Option<PathBuf>,
    pub size: [u32; 2],
}

impl CarouselSlot {
    pub fn is_selected(&self) -> bool {
        self.role == SlotRole::Center
    }
}

/// Everything needed to draw one carousel frame
#[derive(Debug, Clone, PartialEq)]
pub struct CarouselView {
    pub left: CarouselSlot,
    pub center: CarouselSlot,
    pub right: CarouselSlot,
    /// Progress indicator value (1-based)
    pub position: usize,
    pub total: usize,
}

impl CarouselView {
    /// Compute the view for the library's current position.
    /// Returns `None` for an empty library.
    pub fn compute(library: &RomLibrary, config: &Config) -> Option<Self> {
        let left = library.wrapped(-1)?;
        let center = library.index();
        let right = library.wrapped(1)?;
        let (position, total) = library.progress();

        let slot = |role: SlotRole, index: usize, size: [u32; 2]| {
            let rom_name = library.get(index).unwrap_or_default().to_string();
            CarouselSlot {
                role,
                index,
                title: display_title(&rom_name),
                artwork: artwork_for(config, &rom_name),
                rom_name,
                size,
            }
        };

        Some(Self {
            left: slot(SlotRole::Left, left, SIDE_SIZE),
            center: slot(SlotRole::Center, center, CENTER_SIZE),
            right: slot(SlotRole::Right, right, SIDE_SIZE),
            position,
            total,
        })
    }

    pub fn slots(&self) -> [&CarouselSlot; 3] {
        [&self.left, &self.center, &self.right]
    }

    /// Progress as a fraction for a progress bar
    pub fn progress_fraction(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.position as f32 / self.total as f32
        }
    }
}

/// Title shown under a pane: the stem, truncated when too long
pub fn display_title(rom_name: &str) -> String {
    truncate_title(rom_stem(rom_name))
}

pub fn truncate_title(title: &str) -> String {
    if title.chars().count() > MAX_TITLE_CHARS {
        let kept: String = title.chars().take(TRUNCATED_TITLE_CHARS).collect();
        format!("{}...", kept)
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library(names: &[&str]) -> RomLibrary {
        RomLibrary::new(names.iter().map(|n| n.to_string()).collect())
    }

    #[test]
    fn three_rom_neighbors() {
        let lib = library(&["a.gba", "b.sfc", "c.gba"]);
        let view = CarouselView::compute(&lib, &Config::default()).unwrap();

        assert_eq!(view.left.index, 2);
        assert_eq!(view.left.rom_name, "c.gba");
        assert_eq!(view.right.index, 1);
        assert_eq!(view.right.rom_name, "b.sfc");
        assert_eq!(view.center.title, "a");
        assert!(view.center.is_selected());
        assert_eq!(view.center.size, CENTER_SIZE);
        assert_eq!(view.left.size, SIDE_SIZE);
        assert_eq!((view.position, view.total), (1, 3));
    }

    #[test]
    fn neighbors_are_distinct_from_three_up() {
        let names: Vec<String> = (0..7).map(|i| format!("{}.gba", i)).collect();
        for n in 3..names.len() {
            let mut lib = RomLibrary::new(names[..n].to_vec());
            for i in 0..n {
                let view = CarouselView::compute(&lib, &Config::default()).unwrap();
                assert_eq!(view.center.index, i);
                assert_eq!(view.left.index, (i + n - 1) % n);
                assert_eq!(view.right.index, (i + 1) % n);
                assert_ne!(view.left.index, i);
                assert_ne!(view.right.index, i);
                lib.move_right();
            }
        }
    }

    #[test]
    fn single_rom_fills_every_pane() {
        let lib = library(&["only.sfc"]);
        let view = CarouselView::compute(&lib, &Config::default()).unwrap();
        assert!(view.slots().iter().all(|s| s.index == 0));
        assert_eq!(view.progress_fraction(), 1.0);
    }

    #[test]
    fn empty_library_has_no_view() {
        assert!(CarouselView::compute(&RomLibrary::default(), &Config::default()).is_none());
    }

    #[test]
    fn titles_truncate_past_23_chars() {
        let exact = "a".repeat(23);
        assert_eq!(truncate_title(&exact), exact);

        let long = "abcdefghijklmnopqrstuvwxyz";
        assert_eq!(truncate_title(long), "abcdefghijklmnopqrst...");
        assert_eq!(truncate_title(long).chars().count(), 23);

        assert_eq!(
            display_title("The Legend of Zelda - A Link to the Past.sfc"),
            "The Legend of Zelda ..."
        );
        assert_eq!(display_title("Pokémon Rubí Edición Especial.gba"), "Pokémon Rubí Edición...");
    }
}
