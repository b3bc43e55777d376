pub mod png_overlay_writer;
