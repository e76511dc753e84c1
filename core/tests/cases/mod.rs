mod grid;
mod properties;
mod timing;
