//! Jaeger tracer setup in the example main

use crate::codegen::{File, FileSet, ImportSpec, PatchMode, RegexPatch, add_import, patch_file};
use crate::core::error::Result;
use crate::design::{Root, http_roots};
use crate::plugin::{GenContext, Plugin};
use crate::scaffold;

pub const NAME: &str = "jaegertracer";

const JAEGER: &str = "github.com/uber/jaeger-client-go";

/// Closing brace of the logger setup block
const LOGGER_BLOCK: &str = r"adapter\s=\smiddleware\.NewLogger\(logger\)\s+\}";

const TRACER_T: &str = r#"

	// Initialize the global tracer.
	tracerCfg := jaegercfg.Configuration{
		Sampler: &jaegercfg.SamplerConfig{
			Type:  jaeger.SamplerTypeConst,
			Param: 1,
		},
		Reporter: &jaegercfg.ReporterConfig{
			LogSpans:           true,
			LocalAgentHostPort: "localhost:5775",
		},
	}
	jLogger := jaegerlog.StdLogger
	closer, err := tracerCfg.InitGlobalTracer(
		"{{ api_pkg }}",
		jaegercfg.Logger(jLogger),
	)
	if err != nil {
		log.Printf("Could not initialize jaeger tracer: %s", err.Error())
	} else {
		defer closer.Close()
	}"#;

/// Initializes a Jaeger global tracer at startup; runs last so the tracer is
/// set up around every other middleware change.
pub struct JaegerTracer;

fn update_main(ctx: &GenContext, file: &mut File, patch: &RegexPatch) -> Result<()> {
    if let Some(header) = ctx.locator().header_mut(file)? {
        for spec in [
            ImportSpec::aliased("jaeger", JAEGER),
            ImportSpec::aliased("jaegercfg", format!("{JAEGER}/config")),
            ImportSpec::aliased("jaegerlog", format!("{JAEGER}/log")),
        ] {
            add_import(header, &spec);
        }
    }
    patch_file(file, patch, ctx.strictness())?;
    Ok(())
}

impl Plugin for JaegerTracer {
    fn name(&self) -> &str {
        NAME
    }

    fn generate(&self, ctx: &GenContext, roots: &[Root], mut files: FileSet) -> Result<FileSet> {
        let locator = ctx.locator();
        let patch = RegexPatch::new(LOGGER_BLOCK, TRACER_T, PatchMode::InsertAfterFirst)?;
        for root in http_roots(roots) {
            for server in root.servers() {
                if let Some(file) = locator.file_mut(&mut files, &scaffold::main_path(&server.name))? {
                    update_main(ctx, file, &patch)?;
                }
            }
        }
        Ok(files)
    }
}
