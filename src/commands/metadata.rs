use anyhow::Result;

use crate::app::Services;
use crate::context::Context;
use crate::metadata::{gateway_url, Assembler};
use crate::sql::{build_single_table, build_two_tables, InterpolatingBuilder};

pub fn upload(ctx: &Context, services: &Services) -> Result<()> {
    let layout = &ctx.layout;
    let assembler = Assembler::new(&services.store, layout.image_uri);
    let records = assembler.assemble(&layout.metadata_dir, &layout.images_dir)?;
    let directory = assembler.upload_directory(&layout.metadata_dir)?;
    log::info!("📦 Uploaded {} metadata files", records.len());

    println!("{directory}");
    println!("{}", gateway_url(&directory));
    Ok(())
}

pub fn prepare_sql(
    ctx: &Context,
    services: &Services,
    main: &str,
    attributes: Option<&str>,
) -> Result<()> {
    let layout = &ctx.layout;
    let records = Assembler::new(&services.store, layout.image_uri)
        .assemble(&layout.metadata_dir, &layout.images_dir)?;

    match attributes {
        None => {
            for statement in build_single_table(&InterpolatingBuilder, main, &records)? {
                println!("{statement}");
            }
        }
        Some(attributes) => {
            for group in build_two_tables(&InterpolatingBuilder, main, attributes, &records)? {
                println!("{}", group.main);
                for statement in &group.attributes {
                    println!("{statement}");
                }
            }
        }
    }
    Ok(())
}
