use locale_store::{
    coding::{Decode, Encode},
    metadata::Field,
    Config, Directory, LineEnding, OpenMode, Record, Tag,
};
use test_log::test;

#[test]
fn record_format_coin_flow_saw() -> locale_store::Result<()> {
    let record = Record::decode_from("905058873\tucdt\tCoin Flow Saw")?;

    assert_eq!(Record::new(905_058_873, Tag::Ucdt, "Coin Flow Saw"), record);
    assert_eq!(locale_store::hash::hash_str("Global.Text.384377"), record.hash);

    let mut line = record.encode_into_string()?;
    line.push_str(LineEnding::Lf.as_str());

    assert_eq!("905058873\tucdt\tCoin Flow Saw\n", line);
    assert_eq!(27, line.chars().count());

    Ok(())
}

#[test]
fn record_format_coin_flow_saw_file() -> locale_store::Result<()> {
    let folder = tempfile::tempdir()?;
    let data_path = folder.path().join("en_us_data.dat");

    let mut content = b"\xEF\xBB\xBF".to_vec();
    content.extend_from_slice(b"905058873\tucdt\tCoin Flow Saw\n");
    std::fs::write(&data_path, &content)?;
    std::fs::write(
        folder.path().join("en_us_data.dir"),
        "## Date:\tThu Mar 13 10:10:13 PDT 2014\n905058873\t3\t26\td\n",
    )?;

    let store = Config::from_data_path(&data_path)
        .mode(OpenMode::Strict)
        .open()?;

    let record = store.get_by_id(384_377)?.expect("should exist");
    assert_eq!("Coin Flow Saw", record.text);

    store.write()?;
    assert_eq!(content, std::fs::read(&data_path)?);

    let directory = Directory::read(&folder.path().join("en_us_data.dir"), 64)?;
    assert_eq!(
        Some("Thu Mar 13 10:10:13 PDT 2014".to_string()),
        directory.metadata.get(Field::Date),
    );
    assert_eq!(26, directory.locations.first().expect("should exist").size);

    Ok(())
}

#[test]
fn record_format_metadata_date() -> locale_store::Result<()> {
    let folder = tempfile::tempdir()?;
    let path = folder.path().join("en_us_data.dir");

    std::fs::write(&path, "## Date:\tThu Mar 13 10:10:13 PDT 2014\n")?;

    let metadata = Directory::read_metadata(&path, 64)?;
    let date = metadata.date().expect("should exist");

    assert_eq!("Thu Mar 13 10:10:13 PDT 2014", date.as_str());
    assert_eq!("PDT", date.zone());
    assert_eq!((2014, 3, 13), date.date());
    assert_eq!((10, 10, 13), date.time());

    Ok(())
}

#[test]
fn record_format_rejects_unknown_metadata() -> locale_store::Result<()> {
    let folder = tempfile::tempdir()?;
    let path = folder.path().join("en_us_data.dir");

    for header in [
        "## Colour:\tblue\n",
        "## Date:\t2014-03-13\n",
        "## Checksum:\tnot hex\n",
        "## Count:\t-1\n",
    ] {
        std::fs::write(&path, header)?;
        assert!(
            matches!(
                Directory::read(&path, 64),
                Err(locale_store::Error::Decode(_)),
            ),
            "{header:?}",
        );
    }

    Ok(())
}
