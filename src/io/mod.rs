pub mod format_registry;
pub mod obj_utils;
pub mod scene_xml;
pub mod scene_xml_writer;
