//! # handy_codes
//!
//! Gesture-driven code editor.  A hand held in front of the camera in one
//! of six static poses appends that pose's Python snippet to the editor,
//! runs it, and prints the output in the console pane.
//!
//! ## Gesture → Snippet mapping
//!
//! | Gesture | Fingers up | Snippet |
//! |---|---|---|
//! | `open_palm` | all five | `print("Hello World")` |
//! | `thumbs_up` | thumb only | assigns and prints `x` |
//! | `victory` | index + middle | an `if` on `x` |
//! | `pointing_index` | index only | a five-step `for` loop |
//! | `fist` | none | prints a stop message |
//! | `three_fingers` | any three | defines and calls `greet` |
//!
//! A pose must be held for 0.3 s to fire, and fires at most once per
//! second.  Both are configurable in `handy_codes.json`.
//!
//! ## Camera backends
//!
//! * `sim` (default): **simulation mode**, the keyboard poses a synthetic
//!   hand.
//! * `sidecar`: an external landmark detector process owns the real camera
//!   and streams hands as JSON lines (see [`sidecar`]).
//!
//! ### Keyboard
//!
//! | Key | Action |
//! |---|---|
//! | `F1`–`F6` held | Pose the simulated hand (guide order) |
//! | `F7` held | Thumb + index, recognised as nothing |
//! | `Ctrl+R` | Run the editor contents |
//! | `Ctrl+L` | Clear editor and program |
//! | `Ctrl+S` | Save editor text to `handycodes_YYYYmmdd_HHMMSS.py` |
//! | `Ctrl+P` | Pause / resume the camera |
//! | `F9` / `F10` | Previous / next camera |
//! | `Escape` | Quit |

pub mod settings;
pub mod logging;
pub mod camera;
pub mod sidecar;
pub mod pose;
pub mod provider;
pub mod editor;
pub mod highlight;
pub mod font;
pub mod session;
pub mod visualizer;
pub mod app;
