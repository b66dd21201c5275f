pub mod carousel;
pub mod dismissal;
pub mod gallery;
pub mod input;

pub use carousel::{CarouselAutoplay, CarouselGuard, SnapStep};
pub use dismissal::{DismissalStack, HistoryEntry, MemoryHistory, NoHistory, OverlayEntry};
pub use gallery::{BackOutcome, FullscreenView, GalleryNavigator, NavigatorState};
pub use input::{action_for_key, Gesture, Key, NavAction, SwipeTracker};
