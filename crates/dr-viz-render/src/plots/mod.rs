pub mod hist1d;
pub mod hist2d;

mod axes_draw;
