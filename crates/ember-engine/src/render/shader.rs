/// A compiled WGSL module.
///
/// The pipeline builds its modules from source, uses them once and drops them;
/// nothing else keeps a reference.
pub struct ShaderModule {
    module: wgpu::ShaderModule,
    label: String,
}

impl ShaderModule {
    pub fn from_wgsl(device: &wgpu::Device, source: &str, label: &str) -> Self {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        log::debug!("shader module `{label}` created");
        Self {
            module,
            label: label.to_owned(),
        }
    }

    pub fn module(&self) -> &wgpu::ShaderModule {
        &self.module
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}
