mod common;

use paldb::{Config, StoreReader, StoreWriter};
use test_log::test;

#[test]
fn store_adjacent_duplicate_values_share_encoding() -> paldb::Result<()> {
    let folder = tempfile::tempdir()?;
    let path = folder.path().join("dupes.paldb");

    let mut writer = StoreWriter::new(Config::default(), std::fs::File::create(&path)?)?;
    writer.put(b"a", b"X")?;
    writer.put(b"b", b"X")?;
    writer.put(b"c", b"Y")?;
    writer.put(b"d", b"X")?;
    writer.finish()?;

    let bytes = std::fs::read(&path)?;
    let layout = common::parse_layout(&bytes);

    // Only the consecutive "X"s collapse; "d" gets its own copy again
    let values = common::data_region_values(&bytes, &layout, 1);
    assert_eq!(
        vec![b"X".to_vec(), b"Y".to_vec(), b"X".to_vec()],
        values,
    );

    assert_eq!(
        common::slot_offset_of(&bytes, &layout, b"a"),
        common::slot_offset_of(&bytes, &layout, b"b"),
    );
    assert_ne!(
        common::slot_offset_of(&bytes, &layout, b"a"),
        common::slot_offset_of(&bytes, &layout, b"d"),
    );

    let reader = StoreReader::open(&path)?;
    assert_eq!(Some(b"X" as &[u8]), reader.get(b"a")?);
    assert_eq!(Some(b"X" as &[u8]), reader.get(b"b")?);
    assert_eq!(Some(b"Y" as &[u8]), reader.get(b"c")?);
    assert_eq!(Some(b"X" as &[u8]), reader.get(b"d")?);

    Ok(())
}

#[test]
fn store_interleaved_values_are_not_shared() -> paldb::Result<()> {
    let folder = tempfile::tempdir()?;
    let path = folder.path().join("interleaved.paldb");

    let mut writer = StoreWriter::new(Config::default(), std::fs::File::create(&path)?)?;
    writer.put(b"a", b"X")?;
    writer.put(b"b", b"Y")?;
    writer.put(b"c", b"X")?;
    writer.finish()?;

    let bytes = std::fs::read(&path)?;
    let layout = common::parse_layout(&bytes);

    let values = common::data_region_values(&bytes, &layout, 1);
    assert_eq!(
        vec![b"X".to_vec(), b"Y".to_vec(), b"X".to_vec()],
        values,
    );

    Ok(())
}
