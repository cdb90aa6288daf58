pub mod ljpeg;
