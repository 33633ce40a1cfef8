pub mod combobox;
pub mod controlled;
pub mod drag;
pub mod error;
pub mod multi_select;
pub mod view;

pub use combobox::{Combobox, InputKey};
pub use controlled::{XMultiSelect, XMultiSelectProps};
pub use drag::{DragState, array_move_index};
pub use error::{SelectError, SelectResult};
pub use multi_select::{EventResponse, MultiSelect, MultiSelectProps, SelectInput, SelectResponse};
pub use view::{DropdownView, InputView, MultiSelectView, OptionView, PillView};
